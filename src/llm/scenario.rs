//! Built-in catalogue of meeting contexts.
//!
//! Each [`MeetingContext`] carries a display name, a one-line situation
//! description, typical Vietnamese phrases and English keywords.  The prompt
//! builder uses them to steer generation; the keywords are also
//! transliterated into pronunciation hints.  Context ids that are not in the
//! catalogue get [`GENERIC_CONTEXT`].

use crate::dataset::Difficulty;

// ---------------------------------------------------------------------------
// MeetingContext
// ---------------------------------------------------------------------------

/// Static description of one meeting scenario.
#[derive(Debug)]
pub struct MeetingContext {
    pub id: &'static str,
    pub name: &'static str,
    pub situation: &'static str,
    pub common_phrases: &'static [&'static str],
    pub keywords: &'static [&'static str],
}

/// Fallback for context ids missing from [`CONTEXTS`].
pub static GENERIC_CONTEXT: MeetingContext = MeetingContext {
    id: "generic",
    name: "Cuộc họp công việc",
    situation: "Cuộc họp công việc",
    common_phrases: &[],
    keywords: &["meeting", "team"],
};

static CONTEXTS: &[MeetingContext] = &[
    MeetingContext {
        id: "daily_standup",
        name: "Daily Standup Meeting",
        situation: "Báo cáo tiến độ công việc hàng ngày",
        common_phrases: &[
            "hôm qua em đã",
            "hôm nay em sẽ",
            "có issue nào không",
            "task nào block",
        ],
        keywords: &["task", "issue", "block", "fix", "bug", "code", "commit", "push"],
    },
    MeetingContext {
        id: "sprint_planning",
        name: "Sprint Planning Meeting",
        situation: "Lên kế hoạch và ước lượng công việc cho Sprint",
        common_phrases: &[
            "Sprint này cần",
            "estimate bao nhiêu",
            "user story nào priority",
            "capacity của team",
        ],
        keywords: &[
            "Sprint",
            "backlog",
            "user story",
            "estimate",
            "priority",
            "capacity",
            "velocity",
        ],
    },
    MeetingContext {
        id: "client_presentation",
        name: "Thuyết trình cho Client",
        situation: "Trình bày và demo sản phẩm cho khách hàng",
        common_phrases: &[
            "chúng tôi sẽ demo",
            "feature này giúp",
            "khách hàng có thể",
            "performance cải thiện",
        ],
        keywords: &[
            "demo",
            "feature",
            "dashboard",
            "analytics",
            "user experience",
            "performance",
        ],
    },
    MeetingContext {
        id: "technical_discussion",
        name: "Thảo luận Kỹ thuật",
        situation: "Thảo luận giải pháp kỹ thuật và kiến trúc hệ thống",
        common_phrases: &[
            "architecture này",
            "implement sao",
            "API nào support",
            "database optimize",
        ],
        keywords: &[
            "API",
            "database",
            "architecture",
            "framework",
            "integration",
            "deployment",
        ],
    },
    MeetingContext {
        id: "performance_review",
        name: "Đánh giá Hiệu suất",
        situation: "Đánh giá kết quả công việc và KPI",
        common_phrases: &[
            "KPI tháng này",
            "target đạt chưa",
            "performance cải thiện",
            "skill nào cần học",
        ],
        keywords: &["KPI", "target", "performance", "achievement", "goal", "skill"],
    },
    MeetingContext {
        id: "training_session",
        name: "Buổi Training",
        situation: "Hướng dẫn và đào tạo kỹ năng",
        common_phrases: &[
            "training hôm nay về",
            "skill này quan trọng",
            "practice thêm",
            "có question không",
        ],
        keywords: &["training", "skill", "practice", "workshop", "tutorial", "guide"],
    },
    MeetingContext {
        id: "team_meeting",
        name: "Họp Team",
        situation: "Họp team tổng quát và đồng bộ thông tin",
        common_phrases: &[
            "team mình cần",
            "project tiến độ sao",
            "deadline bên nào",
            "resource đủ chưa",
        ],
        keywords: &["project", "deadline", "resource", "timeline", "update", "sync"],
    },
];

/// Look up a context by id, falling back to [`GENERIC_CONTEXT`].
///
/// ```rust
/// use meeting_codeswitch::llm::scenario::find_context;
///
/// assert_eq!(find_context("sprint_planning").name, "Sprint Planning Meeting");
/// assert_eq!(find_context("offsite").id, "generic");
/// ```
pub fn find_context(id: &str) -> &'static MeetingContext {
    CONTEXTS
        .iter()
        .find(|c| c.id == id)
        .unwrap_or(&GENERIC_CONTEXT)
}

/// All catalogue entries.
pub fn contexts() -> &'static [MeetingContext] {
    CONTEXTS
}

/// One-line generation hint for a difficulty level.
pub fn difficulty_hint(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "Gợi ý: Dùng 1-2 từ tiếng Anh đơn giản, xen kẽ tự nhiên",
        Difficulty::Hard => "Gợi ý: Dùng nhiều thuật ngữ chuyên môn, cụm từ liên tiếp",
        Difficulty::Mixed => "Gợi ý: Kết hợp từ đơn giản và thuật ngữ chuyên môn",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
