use crate::models::SubjectType;

pub const ANALYSIS: &str = include_str!("../data/prompts/analysis.txt");
pub const STYLE_REFERENCE: &str = include_str!("../data/prompts/style_reference.txt");
pub const EDIT_DEFAULT: &str = include_str!("../data/prompts/edit_default.txt");
pub const SUBJECT_NATURE: &str = include_str!("../data/prompts/subject_nature.txt");
pub const SUBJECT_URBAN: &str = include_str!("../data/prompts/subject_urban.txt");
pub const SUBJECT_PORTRAIT: &str = include_str!("../data/prompts/subject_portrait.txt");

const NO_INSTRUCTION: &str = "None given. Use your best judgment for this subject.";

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

pub fn subject_heuristics(subject: SubjectType) -> &'static str {
    match subject {
        SubjectType::Nature => SUBJECT_NATURE,
        SubjectType::Urban => SUBJECT_URBAN,
        SubjectType::Portrait => SUBJECT_PORTRAIT,
    }
}

/// Full analysis instruction for one request.
pub fn analysis_instruction(subject: SubjectType, instruction: &str, has_reference: bool) -> String {
    let instruction = instruction.trim();
    let instruction = if instruction.is_empty() {
        NO_INSTRUCTION
    } else {
        instruction
    };

    let subject_name = subject.to_string();
    let mut text = render(
        ANALYSIS,
        &[
            ("subject", subject_name.as_str()),
            ("heuristics", subject_heuristics(subject).trim_end()),
            ("instruction", instruction),
        ],
    );

    if has_reference {
        text.push_str(STYLE_REFERENCE.trim_end());
    }
    text
}

/// The caller's instruction, or the default enhancement when blank.
pub fn edit_instruction(instruction: Option<&str>) -> String {
    match instruction.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => EDIT_DEFAULT.trim().to_string(),
    }
}
