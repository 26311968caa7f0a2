//! Canned, schema-correct suggestions used when the model output cannot be recovered.

use crate::generation::models::{Suggestion, TaskKind};

const SUMMARY_FALLBACK: [(&str, &str); 3] = [
    (
        "Entry-Level",
        "Recent graduate with foundational knowledge in software development and programming languages. \
         Eager to apply academic learning to real-world projects and grow as a professional developer.",
    ),
    (
        "Mid-Level",
        "Experienced software professional with several years of hands-on development experience. \
         Skilled in building scalable solutions and collaborating with cross-functional teams to deliver high-quality products.",
    ),
    (
        "Senior-Level",
        "Seasoned software expert with extensive experience in architecting complex systems. \
         Proven leadership abilities in guiding teams and implementing best practices while staying current with emerging technologies.",
    ),
];

const EXPERIENCE_FALLBACK: [(&str, &str); 3] = [
    (
        "Entry-Level",
        "• Supported team projects by completing assigned tasks on schedule\n\
         • Assisted with data collection and analysis\n\
         • Participated in team meetings and contributed ideas",
    ),
    (
        "Mid-Level",
        "• Managed key projects from concept to completion\n\
         • Collaborated with cross-functional teams to achieve business objectives\n\
         • Implemented process improvements that increased efficiency",
    ),
    (
        "Senior-Level",
        "• Led strategic initiatives resulting in significant business growth\n\
         • Directed team of professionals, providing mentorship and guidance\n\
         • Pioneered innovative approaches to solve complex problems",
    ),
];

const EDUCATION_FALLBACK: [(&str, &str); 3] = [
    (
        "Basic",
        "• Completed foundational coursework in major subjects with strong academic standing\n\
         • Participated in relevant student organizations and academic groups\n\
         • Developed essential skills in critical thinking and problem-solving",
    ),
    (
        "Intermediate",
        "• Conducted research projects relevant to field of study under faculty supervision\n\
         • Collaborated with peers on group assignments and presentations\n\
         • Applied theoretical knowledge to practical scenarios through coursework",
    ),
    (
        "Advanced",
        "• Led research initiatives resulting in notable academic contributions\n\
         • Presented findings at department symposiums and student conferences\n\
         • Developed specialized knowledge through advanced coursework and independent studies",
    ),
];

/// Fallback suggestions for the suggestion kinds. `None` for quiz and report
/// kinds, which have no canned value.
pub fn fallback_suggestions(kind: TaskKind) -> Option<Vec<Suggestion>> {
    let entries = match kind {
        TaskKind::Summary => &SUMMARY_FALLBACK,
        TaskKind::ExperienceBullets => &EXPERIENCE_FALLBACK,
        TaskKind::EducationBullets => &EDUCATION_FALLBACK,
        TaskKind::QuizQuestions | TaskKind::AtsMatchReport | TaskKind::ResumeReview => return None,
    };
    Some(
        entries
            .iter()
            .map(|(level, content)| Suggestion::new(level, content))
            .collect(),
    )
}

/// The levels a suggestion kind is expected to produce, in order.
pub fn expected_levels(kind: TaskKind) -> &'static [&'static str] {
    match kind {
        TaskKind::EducationBullets => &["Basic", "Intermediate", "Advanced"],
        TaskKind::Summary | TaskKind::ExperienceBullets => {
            &["Entry-Level", "Mid-Level", "Senior-Level"]
        }
        _ => &[],
    }
}
