/// Derive the template variable / bucket name for a class name
///
/// Upper-case letters after the first character start a new word:
/// `StudySubject` becomes `study_subject`, `Observation` becomes
/// `observation`. Names that are already snake case pass through.
pub fn var_name(class_name: &str) -> String {
    let mut out = String::with_capacity(class_name.len() + 4);
    for (i, ch) in class_name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
