//! Output directory and file naming.

use fhirflat_store::StoredEvent;

/// Directory name of one patient: `{family}_{birth_date}_{given}`.
///
/// Two patients sharing all three values share a directory.
pub fn patient_dir_name(family_name: &str, birth_date: &str, given_name: &str) -> String {
    sanitize(&format!("{family_name}_{birth_date}_{given_name}"))
}

/// File name of one event: `<event_id>_<ResourceType>.csv`.
pub fn event_file_name(event: &StoredEvent) -> String {
    format!("{}_{}.csv", event.event_id, sanitize(&event.resource_type))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch == '/' || ch == '\\' || ch.is_whitespace() || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhirflat_model::EventId;

    #[test]
    fn joins_name_parts() {
        assert_eq!(
            patient_dir_name("O'Brien", "1961-04-12", "Mary Jane"),
            "O'Brien_1961-04-12_Mary_Jane"
        );
    }

    #[test]
    fn replaces_path_separators() {
        assert_eq!(patient_dir_name("A/B", "2000-01-01", "C\\D"), "A_B_2000-01-01_C_D");
    }

    #[test]
    fn event_file_uses_id_and_kind() {
        let event = StoredEvent {
            event_id: EventId::new(17),
            resource_type: "Observation".to_string(),
            payload: "{}".to_string(),
        };
        assert_eq!(event_file_name(&event), "17_Observation.csv");
    }
}
