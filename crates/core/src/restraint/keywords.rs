//! Keyword tables for restraint classification and intent screening.
//!
//! Each rule is one ordered list of `(keyword, tag)` pairs. Matching is a case-insensitive
//! substring test over lower-cased text; the tables hold lower-case keywords only. Entries are
//! bilingual because care notes arrive in English and Spanish.

use super::RestraintType;

/// What a keyword says about why a chemical restraint is being used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntentSignal {
    /// A diagnosed condition or procedure that justifies medication.
    Medical,
    /// Use aimed at controlling conduct.
    Behavioral,
}

/// Ordered `specificType` keywords. Chemical entries come first, then mechanical, then
/// environmental; the first entry found in the text decides the type.
pub const RESTRAINT_TYPE_KEYWORDS: &[(&str, RestraintType)] = &[
    ("sedative", RestraintType::Chemical),
    ("sedante", RestraintType::Chemical),
    ("tranquilizer", RestraintType::Chemical),
    ("tranquilizante", RestraintType::Chemical),
    ("antipsychotic", RestraintType::Chemical),
    ("antipsicótico", RestraintType::Chemical),
    ("antipsicotico", RestraintType::Chemical),
    ("benzodiazepine", RestraintType::Chemical),
    ("benzodiacepina", RestraintType::Chemical),
    ("rail", RestraintType::Mechanical),
    ("barandilla", RestraintType::Mechanical),
    ("belt", RestraintType::Mechanical),
    ("cinturón", RestraintType::Mechanical),
    ("cinturon", RestraintType::Mechanical),
    ("restraint strap", RestraintType::Mechanical),
    ("correa", RestraintType::Mechanical),
    ("vest", RestraintType::Mechanical),
    ("chaleco", RestraintType::Mechanical),
    ("door", RestraintType::Environmental),
    ("puerta", RestraintType::Environmental),
    ("alarm", RestraintType::Environmental),
    ("alarma", RestraintType::Environmental),
    ("sensor", RestraintType::Environmental),
    ("lock", RestraintType::Environmental),
    ("cerradura", RestraintType::Environmental),
];

/// Intent keywords screened in a chemical restraint's justification and `specificType`.
///
/// A medical match anywhere in the text outranks every behavioural match.
pub const CHEMICAL_INTENT_KEYWORDS: &[(&str, IntentSignal)] = &[
    ("clinical anxiety disorder", IntentSignal::Medical),
    ("anxiety disorder", IntentSignal::Medical),
    ("ansiedad clínica", IntentSignal::Medical),
    ("trastorno de ansiedad", IntentSignal::Medical),
    ("seizure", IntentSignal::Medical),
    ("convulsion", IntentSignal::Medical),
    ("convulsión", IntentSignal::Medical),
    ("epilep", IntentSignal::Medical),
    ("surgical procedure", IntentSignal::Medical),
    ("procedimiento quirúrgico", IntentSignal::Medical),
    ("cirugía", IntentSignal::Medical),
    ("severe pain", IntentSignal::Medical),
    ("dolor severo", IntentSignal::Medical),
    ("dolor intenso", IntentSignal::Medical),
    ("delirium tremens", IntentSignal::Medical),
    ("alcohol withdrawal", IntentSignal::Medical),
    ("abstinencia alcohólica", IntentSignal::Medical),
    ("palliative sedation", IntentSignal::Medical),
    ("sedación paliativa", IntentSignal::Medical),
    ("agitation", IntentSignal::Behavioral),
    ("agitated", IntentSignal::Behavioral),
    ("agitado", IntentSignal::Behavioral),
    ("agitada", IntentSignal::Behavioral),
    ("agitación", IntentSignal::Behavioral),
    ("aggressive", IntentSignal::Behavioral),
    ("aggression", IntentSignal::Behavioral),
    ("agresivo", IntentSignal::Behavioral),
    ("agresiva", IntentSignal::Behavioral),
    ("agresividad", IntentSignal::Behavioral),
    ("wandering", IntentSignal::Behavioral),
    ("deambula", IntentSignal::Behavioral),
    ("non-cooperative", IntentSignal::Behavioral),
    ("uncooperative", IntentSignal::Behavioral),
    ("no coopera", IntentSignal::Behavioral),
    ("confusion", IntentSignal::Behavioral),
    ("confused", IntentSignal::Behavioral),
    ("confusión", IntentSignal::Behavioral),
    ("confuso", IntentSignal::Behavioral),
    ("confusa", IntentSignal::Behavioral),
    ("restless", IntentSignal::Behavioral),
    ("inquieto", IntentSignal::Behavioral),
    ("inquieta", IntentSignal::Behavioral),
    ("combative", IntentSignal::Behavioral),
    ("disruptive", IntentSignal::Behavioral),
    ("shouting", IntentSignal::Behavioral),
    ("grita", IntentSignal::Behavioral),
    ("behavior", IntentSignal::Behavioral),
    ("behaviour", IntentSignal::Behavioral),
    ("conducta", IntentSignal::Behavioral),
    ("comportamiento", IntentSignal::Behavioral),
];

/// Tag of the first table entry whose keyword occurs in `text`.
pub fn first_match<T: Copy>(table: &[(&str, T)], text: &str) -> Option<T> {
    let text = text.to_lowercase();
    table
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, tag)| *tag)
}

/// True when any keyword tagged `tag` occurs in `text`.
pub fn matches_tag<T: PartialEq>(table: &[(&str, T)], text: &str, tag: &T) -> bool {
    let text = text.to_lowercase();
    table
        .iter()
        .any(|(keyword, t)| t == tag && text.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_hold_lowercase_keywords_only() {
        for (keyword, _) in RESTRAINT_TYPE_KEYWORDS {
            assert_eq!(*keyword, keyword.to_lowercase());
        }
        for (keyword, _) in CHEMICAL_INTENT_KEYWORDS {
            assert_eq!(*keyword, keyword.to_lowercase());
        }
    }

    #[test]
    fn test_type_table_is_grouped_chemical_mechanical_environmental() {
        let order: Vec<RestraintType> = RESTRAINT_TYPE_KEYWORDS.iter().map(|(_, t)| *t).collect();
        let mut groups = order.clone();
        groups.dedup();
        assert_eq!(
            groups,
            vec![
                RestraintType::Chemical,
                RestraintType::Mechanical,
                RestraintType::Environmental
            ]
        );
    }

    #[test]
    fn test_first_match_respects_table_order() {
        let table = [("bed", 1), ("bed rail", 2)];
        assert_eq!(first_match(&table, "BED RAIL"), Some(1));
        assert_eq!(first_match(&table, "chair"), None);
    }

    #[test]
    fn test_matches_tag_is_case_insensitive() {
        assert!(matches_tag(
            CHEMICAL_INTENT_KEYWORDS,
            "Trastorno de Ansiedad Clínica",
            &IntentSignal::Medical
        ));
        assert!(matches_tag(
            CHEMICAL_INTENT_KEYWORDS,
            "Resident is AGITATED at night",
            &IntentSignal::Behavioral
        ));
        assert!(!matches_tag(
            CHEMICAL_INTENT_KEYWORDS,
            "Resident is AGITATED at night",
            &IntentSignal::Medical
        ));
    }
}
