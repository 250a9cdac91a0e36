//! Enrollment validation.
//!
//! The enrollment step may only be left once the hospital, doctor, patient name, age and
//! contact number are filled in. Checking produces either the validated values or every
//! failing field at once, so the form can mark all of them in a single round trip.

use crate::draft::{Field, FieldErrors, RegistrationDraft};
use scanreg_types::{ContactNumber, NonEmptyText, TextError};

/// Enrollment values that passed [`validate_enrollment`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enrollment {
    pub hospital_id: NonEmptyText,
    pub doctor_id: NonEmptyText,
    pub patient_name: NonEmptyText,
    pub age: NonEmptyText,
    pub contact_no: ContactNumber,
}

/// Checks the required enrollment fields of `draft`.
///
/// # Errors
///
/// Returns the set of failing fields, each with a message suitable for showing next to the
/// input.
pub fn validate_enrollment(draft: &RegistrationDraft) -> Result<Enrollment, FieldErrors> {
    let mut errors = FieldErrors::new();

    let hospital_id = required(draft.hospital_id().unwrap_or(""), Field::Hospital, &mut errors);
    let doctor_id = required(draft.doctor_id().unwrap_or(""), Field::Doctor, &mut errors);
    let patient_name = required(draft.patient_name(), Field::PatientName, &mut errors);
    let age = required(draft.age(), Field::Age, &mut errors);
    let contact_no = match ContactNumber::new(draft.contact_no()) {
        Ok(number) => Some(number),
        Err(TextError::Empty) => {
            errors.insert(Field::ContactNumber, "required");
            None
        }
        Err(e) => {
            errors.insert(Field::ContactNumber, e.to_string());
            None
        }
    };

    match (hospital_id, doctor_id, patient_name, age, contact_no) {
        (Some(hospital_id), Some(doctor_id), Some(patient_name), Some(age), Some(contact_no)) => {
            Ok(Enrollment {
                hospital_id,
                doctor_id,
                patient_name,
                age,
                contact_no,
            })
        }
        _ => Err(errors),
    }
}

fn required(value: &str, field: Field, errors: &mut FieldErrors) -> Option<NonEmptyText> {
    match NonEmptyText::new(value) {
        Ok(text) => Some(text),
        Err(_) => {
            errors.insert(field, "required");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryTable;

    fn filled_draft() -> RegistrationDraft {
        let mut draft = RegistrationDraft::new(&CategoryTable::default());
        draft.hospital_id = Some("1".into());
        draft.doctor_id = Some("7".into());
        draft.patient_name = "Asha Meena".into();
        draft.age = "34".into();
        draft.contact_no = "9829012345".into();
        draft
    }

    #[test]
    fn complete_enrollment_passes() {
        let enrollment = validate_enrollment(&filled_draft()).expect("valid enrollment");
        assert_eq!(enrollment.patient_name.as_str(), "Asha Meena");
        assert_eq!(enrollment.contact_no.as_str(), "9829012345");
    }

    #[test]
    fn empty_draft_reports_every_required_field() {
        let draft = RegistrationDraft::new(&CategoryTable::default());
        let errors = validate_enrollment(&draft).expect_err("empty draft must fail");
        for field in [
            Field::Hospital,
            Field::Doctor,
            Field::PatientName,
            Field::Age,
            Field::ContactNumber,
        ] {
            assert_eq!(errors.get(field), Some("required"), "{field}");
        }
    }

    #[test]
    fn whitespace_name_is_missing() {
        let mut draft = filled_draft();
        draft.patient_name = "   ".into();
        let errors = validate_enrollment(&draft).expect_err("blank name must fail");
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(Field::PatientName));
    }

    #[test]
    fn malformed_contact_number_has_its_own_message() {
        let mut draft = filled_draft();
        draft.contact_no = "98290x2345".into();
        let errors = validate_enrollment(&draft).expect_err("bad number must fail");
        assert!(errors
            .get(Field::ContactNumber)
            .is_some_and(|msg| msg.contains("digits")));
    }
}
