// Prompt templates for every task kind, and the builder that fills them.
// Templates use `{name}` slots filled in a single pass by `fill_template`.

use crate::generation::models::{present, GenerationContext, TaskKind, QUIZ_QUESTION_COUNT};
use crate::llm_client::prompts::{
    BULLET_STYLE_RULES, END_DATE_PLACEHOLDER, JSON_ARRAY_ONLY_INSTRUCTION,
    NO_DESCRIPTION_PLACEHOLDER, NOT_SPECIFIED, START_DATE_PLACEHOLDER,
};

const DEFAULT_SUMMARY_JOB_TITLE: &str = "Software Engineer";
const DEFAULT_DIFFICULTY: &str = "medium";

/// Summary prompt. Replace: {job_title}, {json_only}
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Generate 3 professional resume summary examples for someone with the job title: "{job_title}".

For each summary:
- First summary should be for Entry-Level (0-2 years experience)
- Second summary should be for Mid-Level (3-6 years experience)
- Third summary should be for Senior-Level (7+ years experience)
- Make each 3-5 sentences long
- Focus on key skills and accomplishments
- Use professional language
- Include relevant industry keywords

Return a JSON array of EXACTLY 3 objects. Each object has EXACTLY these two keys:
- "experience_level": one of "Entry-Level", "Mid-Level", "Senior-Level"
- "summary": the summary text

Format:
[
  {"experience_level": "Entry-Level", "summary": "Summary text here..."},
  {"experience_level": "Mid-Level", "summary": "Summary text here..."},
  {"experience_level": "Senior-Level", "summary": "Summary text here..."}
]

{json_only}"#;

/// Experience prompt.
/// Replace: {company}, {job_title}, {location}, {start_date}, {end_date},
///          {description}, {bullet_rules}, {json_only}
pub const EXPERIENCE_PROMPT_TEMPLATE: &str = r#"Create three professional work experience descriptions for a resume based on the following information:

Company: {company}
Job Title: {job_title}
Location: {location}
Duration: {start_date} to {end_date}
Current Description: {description}

Return a JSON array of EXACTLY 3 objects. Each object has EXACTLY these two keys:
- "activity_level": one of "Entry-Level", "Mid-Level", "Senior-Level"
- "description": a bullet-point description with 3-5 points

{bullet_rules}
- Include specific achievements and metrics when possible
- Highlight relevant skills and responsibilities

Format:
[
  {"activity_level": "Entry-Level", "description": "• Collaborated with team members to...\n• Assisted in developing..."},
  {"activity_level": "Mid-Level", "description": "• Led a team of X members to...\n• Implemented new processes that improved..."},
  {"activity_level": "Senior-Level", "description": "• Spearheaded the strategic initiative that...\n• Directed cross-functional teams to deliver..."}
]

{json_only}"#;

/// Education prompt.
/// Replace: {university_name}, {degree}, {major}, {start_date}, {end_date},
///          {description}, {bullet_rules}, {json_only}
pub const EDUCATION_PROMPT_TEMPLATE: &str = r#"Create three professional education descriptions for a resume based on the following information:

University/Institute: {university_name}
Degree: {degree}
Major/Field of Study: {major}
Duration: {start_date} to {end_date}
Current Description: {description}

Return a JSON array of EXACTLY 3 objects. Each object has EXACTLY these two keys:
- "activity_level": one of "Basic", "Intermediate", "Advanced"
- "description": a bullet-point description with 3-5 points that highlight educational achievements

{bullet_rules}
- Include relevant coursework, projects, or academic achievements
- Highlight skills and knowledge acquired

Format:
[
  {"activity_level": "Basic", "description": "• Completed coursework in...\n• Participated in..."},
  {"activity_level": "Intermediate", "description": "• Conducted research on...\n• Implemented projects that..."},
  {"activity_level": "Advanced", "description": "• Led research team investigating...\n• Published academic papers on..."}
]

{json_only}"#;

/// Quiz prompt. Replace: {count}, {job_profile}, {difficulty}, {json_only}
pub const QUIZ_PROMPT_TEMPLATE: &str = r#"Generate exactly {count} multiple-choice interview questions for a {job_profile} role at a {difficulty} difficulty level.

Return a JSON array of EXACTLY {count} objects. Each object has EXACTLY these keys:
- "id": integer identifier, 1 to {count}, each used once
- "question": the question text
- "options": an object with EXACTLY the keys "A", "B", "C", "D", each an answer choice string
- "correctAnswer": the correct option, one of "A", "B", "C", "D"
- "explanation": a short explanation of the correct answer

Format:
[
  {"id": 1, "question": "...", "options": {"A": "...", "B": "...", "C": "...", "D": "..."}, "correctAnswer": "A", "explanation": "..."}
]

{json_only}"#;

/// ATS match prompt. Replace: {job_description}, {resume_text}
pub const ATS_MATCH_PROMPT_TEMPLATE: &str = r#"I need a detailed ATS (Applicant Tracking System) compatibility analysis between a job description and resume. Provide a percentage match score and specific suggestions for improvement.

JOB DESCRIPTION:
{job_description}

RESUME:
{resume_text}

Please analyze:
1. Overall match percentage between resume and job description
2. Key skills/requirements present in the job description but missing in resume
3. Suggestions to improve ATS compatibility
4. Optimal keywords to add
5. Format and structure recommendations

Please format your response in a clear, structured way with headings and bullet points. Do not respond with JSON."#;

/// Standalone resume review prompt. Replace: {resume_text}
pub const RESUME_REVIEW_PROMPT_TEMPLATE: &str = r#"You are an ATS (Applicant Tracking System) resume analyzer.
- Analyze the following resume and provide an ATS score (out of 100).
- Give feedback on strengths and weaknesses.
- Suggest improvements for better job matching.

Please format your response with headings and bullet points.

Resume Content:
{resume_text}"#;

/// Builds the complete instruction string for `kind`. Never fails: every
/// missing field is replaced by its placeholder.
pub fn build_prompt(kind: TaskKind, ctx: &GenerationContext) -> String {
    let or = |field: &Option<String>, placeholder: &'static str| -> String {
        present(field).unwrap_or(placeholder).to_string()
    };

    match kind {
        TaskKind::Summary => fill_template(
            SUMMARY_PROMPT_TEMPLATE,
            &[
                ("job_title", or(&ctx.job_title, DEFAULT_SUMMARY_JOB_TITLE)),
                ("json_only", JSON_ARRAY_ONLY_INSTRUCTION.to_string()),
            ],
        ),
        TaskKind::ExperienceBullets => fill_template(
            EXPERIENCE_PROMPT_TEMPLATE,
            &[
                ("company", or(&ctx.company, NOT_SPECIFIED)),
                ("job_title", or(&ctx.job_title, NOT_SPECIFIED)),
                ("location", or(&ctx.location, NOT_SPECIFIED)),
                ("start_date", or(&ctx.start_date, START_DATE_PLACEHOLDER)),
                ("end_date", or(&ctx.end_date, END_DATE_PLACEHOLDER)),
                ("description", or(&ctx.description, NO_DESCRIPTION_PLACEHOLDER)),
                ("bullet_rules", BULLET_STYLE_RULES.to_string()),
                ("json_only", JSON_ARRAY_ONLY_INSTRUCTION.to_string()),
            ],
        ),
        TaskKind::EducationBullets => fill_template(
            EDUCATION_PROMPT_TEMPLATE,
            &[
                ("university_name", or(&ctx.university_name, NOT_SPECIFIED)),
                ("degree", or(&ctx.degree, NOT_SPECIFIED)),
                ("major", or(&ctx.major, NOT_SPECIFIED)),
                ("start_date", or(&ctx.start_date, START_DATE_PLACEHOLDER)),
                ("end_date", or(&ctx.end_date, END_DATE_PLACEHOLDER)),
                ("description", or(&ctx.description, NO_DESCRIPTION_PLACEHOLDER)),
                ("bullet_rules", BULLET_STYLE_RULES.to_string()),
                ("json_only", JSON_ARRAY_ONLY_INSTRUCTION.to_string()),
            ],
        ),
        TaskKind::QuizQuestions => fill_template(
            QUIZ_PROMPT_TEMPLATE,
            &[
                ("count", QUIZ_QUESTION_COUNT.to_string()),
                ("job_profile", or(&ctx.job_profile, NOT_SPECIFIED)),
                ("difficulty", or(&ctx.difficulty, DEFAULT_DIFFICULTY)),
                ("json_only", JSON_ARRAY_ONLY_INSTRUCTION.to_string()),
            ],
        ),
        TaskKind::AtsMatchReport => fill_template(
            ATS_MATCH_PROMPT_TEMPLATE,
            &[
                ("job_description", or(&ctx.job_description, NOT_SPECIFIED)),
                ("resume_text", or(&ctx.resume_text, NOT_SPECIFIED)),
            ],
        ),
        TaskKind::ResumeReview => fill_template(
            RESUME_REVIEW_PROMPT_TEMPLATE,
            &[("resume_text", or(&ctx.resume_text, NOT_SPECIFIED))],
        ),
    }
}

/// Replaces each `{name}` slot in one left-to-right pass. Substituted values
/// are copied as-is and never rescanned, so user text containing `{...}` is
/// embedded verbatim. Braces that do not name a slot (the JSON examples in
/// the templates) are left alone.
fn fill_template(template: &str, slots: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            slots
                .iter()
                .find(|(slot, _)| *slot == name)
                .map(|(_, value)| (close, value))
        });
        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
