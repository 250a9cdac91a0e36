//! The three-step registration wizard.
//!
//! ```text
//! Enrollment --(required fields)--> ScanOptions --(>= 1 scan)--> Payment --submit--> Enrollment
//!      ^                                 |                          |
//!      +------------- back --------------+---------- back ----------+
//! ```
//!
//! Moving forward always passes the guard of the step being left, whether by [`next`] or by
//! jumping with [`go_to`]. Moving back never touches the draft.
//!
//! [`next`]: RegistrationWizard::next
//! [`go_to`]: RegistrationWizard::go_to

use crate::catalog::{Doctor, Hospital, ScanId, ScanOption};
use crate::category::CategoryTable;
use crate::directory::Directory;
use crate::draft::{EnrollmentDetails, FieldErrors, RegistrationDraft};
use crate::error::{IntakeError, IntakeResult};
use crate::pricing::check_amount;
use crate::record::PatientRecord;
use crate::store::{Confirmation, PatientStore};
use crate::validation::validate_enrollment;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use scanreg_ids::CroSequence;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    #[default]
    Enrollment,
    ScanOptions,
    Payment,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::Enrollment => "enrollment",
            WizardStep::ScanOptions => "scan_options",
            WizardStep::Payment => "payment",
        }
    }

    fn following(self) -> Option<Self> {
        match self {
            WizardStep::Enrollment => Some(WizardStep::ScanOptions),
            WizardStep::ScanOptions => Some(WizardStep::Payment),
            WizardStep::Payment => None,
        }
    }

    fn preceding(self) -> Option<Self> {
        match self {
            WizardStep::Enrollment => None,
            WizardStep::ScanOptions => Some(WizardStep::Enrollment),
            WizardStep::Payment => Some(WizardStep::ScanOptions),
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardStep {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enrollment" => Ok(WizardStep::Enrollment),
            "scan_options" | "scans" => Ok(WizardStep::ScanOptions),
            "payment" => Ok(WizardStep::Payment),
            _ => Err(IntakeError::InvalidInput(format!(
                "invalid step '{s}' (expected enrollment, scan_options or payment)"
            ))),
        }
    }
}

/// One registration in progress: the current step, the draft and the reference data the
/// form offers.
#[derive(Clone, Debug)]
pub struct RegistrationWizard {
    categories: Arc<CategoryTable>,
    step: WizardStep,
    draft: RegistrationDraft,
    hospitals: Vec<Hospital>,
    doctors: Vec<Doctor>,
    catalog: Vec<ScanOption>,
    field_errors: FieldErrors,
}

impl RegistrationWizard {
    /// An empty wizard at [`WizardStep::Enrollment`] with no reference data loaded.
    pub fn new(categories: Arc<CategoryTable>) -> Self {
        let draft = RegistrationDraft::new(&categories);
        Self {
            categories,
            step: WizardStep::Enrollment,
            draft,
            hospitals: Vec::new(),
            doctors: Vec::new(),
            catalog: Vec::new(),
            field_errors: FieldErrors::new(),
        }
    }

    pub fn with_reference_data(
        categories: Arc<CategoryTable>,
        hospitals: Vec<Hospital>,
        doctors: Vec<Doctor>,
        catalog: Vec<ScanOption>,
    ) -> Self {
        let mut wizard = Self::new(categories);
        wizard.hospitals = hospitals;
        wizard.doctors = doctors;
        wizard.catalog = catalog;
        wizard
    }

    /// Loads hospitals, doctors and the scan catalog.
    ///
    /// # Errors
    ///
    /// Returns the first collaborator error. Nothing is replaced unless all three lists load.
    pub async fn mount(&mut self, directory: &dyn Directory) -> IntakeResult<()> {
        let hospitals = directory.hospitals().await?;
        let doctors = directory.doctors().await?;
        let catalog = directory.scans().await?;

        tracing::debug!(
            "wizard mounted with {} hospitals, {} doctors, {} scans",
            hospitals.len(),
            doctors.len(),
            catalog.len()
        );

        self.hospitals = hospitals;
        self.doctors = doctors;
        self.replace_catalog(catalog);
        Ok(())
    }

    /// Re-fetches only the scan catalog.
    ///
    /// # Errors
    ///
    /// Returns the collaborator error; the previous catalog stays in place.
    pub async fn refresh_catalog(&mut self, directory: &dyn Directory) -> IntakeResult<()> {
        let catalog = directory.scans().await?;
        self.replace_catalog(catalog);
        Ok(())
    }

    /// Swaps in a new catalog and reprices the current selection against it.
    pub fn replace_catalog(&mut self, catalog: Vec<ScanOption>) {
        self.catalog = catalog;
        self.draft.reprice(&self.catalog);
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &RegistrationDraft {
        &self.draft
    }

    pub fn hospitals(&self) -> &[Hospital] {
        &self.hospitals
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn catalog(&self) -> &[ScanOption] {
        &self.catalog
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    /// Errors from the most recent enrollment check; empty once it passes.
    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn set_enrollment(&mut self, details: EnrollmentDetails) {
        self.draft.hospital_id = details.hospital_id;
        self.draft.doctor_id = details.doctor_id;
        self.draft.patient_name = details.patient_name;
        self.draft.age = details.age;
        self.draft.age_unit = details.age_unit;
        self.draft.gender = details.gender;
        self.draft.contact_no = details.contact_no;
    }

    pub fn set_category(&mut self, name: &str) {
        self.draft.category = self.categories.category(name);
        self.draft.reprice(&self.catalog);
    }

    /// # Errors
    ///
    /// Returns [`IntakeError::UnknownScan`] if `id` is not in the loaded catalog.
    pub fn select_scan(&mut self, id: ScanId) -> IntakeResult<()> {
        self.ensure_in_catalog(id)?;
        self.draft.selected_scan_ids.insert(id);
        self.draft.reprice(&self.catalog);
        Ok(())
    }

    pub fn deselect_scan(&mut self, id: ScanId) {
        if self.draft.selected_scan_ids.remove(&id) {
            self.draft.reprice(&self.catalog);
        }
    }

    /// Replaces the whole selection.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::UnknownScan`] for the first id not in the catalog, leaving the
    /// previous selection unchanged.
    pub fn set_scan_selection(
        &mut self,
        ids: impl IntoIterator<Item = ScanId>,
    ) -> IntakeResult<()> {
        let ids: BTreeSet<ScanId> = ids.into_iter().collect();
        for id in &ids {
            self.ensure_in_catalog(*id)?;
        }
        self.draft.selected_scan_ids = ids;
        self.draft.reprice(&self.catalog);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidInput`] for a negative or out-of-range amount.
    pub fn set_received_amount(&mut self, amount: Decimal) -> IntakeResult<()> {
        self.draft.received_amount = payment_amount("received amount", amount)?;
        self.draft.recompute_due();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidInput`] for a negative or out-of-range amount.
    pub fn set_discount_amount(&mut self, amount: Decimal) -> IntakeResult<()> {
        self.draft.discount_amount = payment_amount("discount amount", amount)?;
        self.draft.recompute_due();
        Ok(())
    }

    pub fn set_appointment(&mut self, date: Option<NaiveDate>, time: Option<NaiveTime>) {
        self.draft.allot_date = date;
        self.draft.allot_time = time;
    }

    /// Advances one step if the current step's guard passes.
    ///
    /// At [`WizardStep::Payment`] this does nothing; use [`submit`](Self::submit).
    ///
    /// # Errors
    ///
    /// - [`IntakeError::Validation`] leaving enrollment with fields missing. The same set is
    ///   kept in [`field_errors`](Self::field_errors).
    /// - [`IntakeError::NoScanSelected`] leaving scan options with nothing selected.
    pub fn next(&mut self) -> IntakeResult<WizardStep> {
        if let Some(following) = self.step.following() {
            self.check_leaving(self.step)?;
            self.step = following;
        }
        Ok(self.step)
    }

    /// Steps back one step. The draft is left as it is.
    pub fn back(&mut self) -> WizardStep {
        if let Some(preceding) = self.step.preceding() {
            self.step = preceding;
        }
        self.step
    }

    /// Jumps to `target`, as the step indicator does.
    ///
    /// Going back is unconditional. Going forward passes each intermediate guard in order and
    /// stops on the step whose guard fails.
    ///
    /// # Errors
    ///
    /// The error of the first failing guard, as for [`next`](Self::next).
    pub fn go_to(&mut self, target: WizardStep) -> IntakeResult<WizardStep> {
        if target <= self.step {
            self.step = target;
            return Ok(self.step);
        }
        while self.step < target {
            self.next()?;
        }
        Ok(self.step)
    }

    /// Discards the draft and returns to enrollment. Reference data is kept.
    pub fn reset(&mut self) {
        self.draft = RegistrationDraft::new(&self.categories);
        self.step = WizardStep::Enrollment;
        self.field_errors = FieldErrors::new();
    }

    /// Persists the registration under a freshly issued CRO number.
    ///
    /// On success the wizard is reset. On any error the draft and step are kept so the
    /// operator can correct or retry.
    ///
    /// # Errors
    ///
    /// - [`IntakeError::NotAtPaymentStep`] from any other step.
    /// - The guard errors of [`next`](Self::next), re-checked here.
    /// - Whatever the store returns.
    pub async fn submit(
        &mut self,
        store: &dyn PatientStore,
        cro_sequence: &CroSequence,
    ) -> IntakeResult<Confirmation> {
        if self.step != WizardStep::Payment {
            return Err(IntakeError::NotAtPaymentStep(self.step));
        }

        let record = match PatientRecord::from_draft(&self.draft) {
            Ok(record) => record,
            Err(IntakeError::Validation(errors)) => {
                self.field_errors = errors.clone();
                return Err(IntakeError::Validation(errors));
            }
            Err(e) => return Err(e),
        };

        let cro = cro_sequence.next();
        let request = record.to_wire(&cro);

        match store.create_patient(&request).await {
            Ok(confirmation) => {
                tracing::info!(
                    "registration {} submitted ({} scans, total {}, due {})",
                    confirmation.cro,
                    record.scan_ids.len(),
                    request.total_amount,
                    request.due_amount
                );
                self.reset();
                Ok(confirmation)
            }
            Err(e) => {
                tracing::warn!("registration {} not stored, draft kept: {}", cro, e);
                Err(e)
            }
        }
    }

    fn check_leaving(&mut self, step: WizardStep) -> IntakeResult<()> {
        match step {
            WizardStep::Enrollment => match validate_enrollment(&self.draft) {
                Ok(_) => {
                    self.field_errors = FieldErrors::new();
                    Ok(())
                }
                Err(errors) => {
                    self.field_errors = errors.clone();
                    Err(IntakeError::Validation(errors))
                }
            },
            WizardStep::ScanOptions if self.draft.selected_scan_ids.is_empty() => {
                Err(IntakeError::NoScanSelected)
            }
            WizardStep::ScanOptions | WizardStep::Payment => Ok(()),
        }
    }

    fn ensure_in_catalog(&self, id: ScanId) -> IntakeResult<()> {
        if self.catalog.iter().any(|scan| scan.id == id) {
            Ok(())
        } else {
            Err(IntakeError::UnknownScan(id))
        }
    }
}

fn payment_amount(what: &str, amount: Decimal) -> IntakeResult<Decimal> {
    if amount < Decimal::ZERO {
        return Err(IntakeError::InvalidInput(format!(
            "{what} cannot be negative (got {amount})"
        )));
    }
    check_amount(what, amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{Field, Gender};
    use api_shared::CreatePatientReq;
    use async_trait::async_trait;
    use scanreg_ids::CroNumber;
    use std::sync::Mutex;

    struct FakeDirectory {
        scans: Vec<ScanOption>,
        fail: bool,
    }

    #[async_trait]
    impl Directory for FakeDirectory {
        async fn hospitals(&self) -> IntakeResult<Vec<Hospital>> {
            if self.fail {
                return Err(IntakeError::Backend("connection refused".into()));
            }
            Ok(vec![Hospital {
                id: "1".into(),
                name: "City Hospital".into(),
            }])
        }

        async fn doctors(&self) -> IntakeResult<Vec<Doctor>> {
            Ok(vec![Doctor {
                id: "7".into(),
                name: "Dr Rao".into(),
                hospital_id: Some("1".into()),
            }])
        }

        async fn scans(&self) -> IntakeResult<Vec<ScanOption>> {
            if self.fail {
                return Err(IntakeError::Backend("connection refused".into()));
            }
            Ok(self.scans.clone())
        }
    }

    #[derive(Default)]
    struct FakeStore {
        fail: bool,
        received: Mutex<Vec<CreatePatientReq>>,
    }

    #[async_trait]
    impl PatientStore for FakeStore {
        async fn create_patient(&self, request: &CreatePatientReq) -> IntakeResult<Confirmation> {
            if self.fail {
                return Err(IntakeError::BackendRejected {
                    status: 500,
                    message: "database unavailable".into(),
                });
            }
            self.received
                .lock()
                .expect("store lock")
                .push(request.clone());
            Ok(Confirmation {
                cro: request.cro.clone(),
                record_id: Some("42".into()),
                message: "created".into(),
            })
        }
    }

    fn catalog() -> Vec<ScanOption> {
        vec![
            ScanOption::new(1u64, "X-Ray Chest", Decimal::from(600), 15).expect("valid"),
            ScanOption::new(2u64, "CT Head", Decimal::from(900), 30).expect("valid"),
        ]
    }

    fn wizard() -> RegistrationWizard {
        RegistrationWizard::with_reference_data(
            Arc::new(CategoryTable::default()),
            Vec::new(),
            Vec::new(),
            catalog(),
        )
    }

    fn enrollment(name: &str) -> EnrollmentDetails {
        EnrollmentDetails {
            hospital_id: Some("1".into()),
            doctor_id: Some("7".into()),
            patient_name: name.into(),
            age: "34".into(),
            gender: Some(Gender::Female),
            contact_no: "9829012345".into(),
            ..EnrollmentDetails::default()
        }
    }

    fn wizard_at_payment() -> RegistrationWizard {
        let mut wizard = wizard();
        wizard.set_enrollment(enrollment("Asha Meena"));
        wizard.next().expect("enrollment complete");
        wizard
            .set_scan_selection([ScanId(1), ScanId(2)])
            .expect("known scans");
        wizard.next().expect("scans selected");
        wizard
    }

    #[test]
    fn empty_name_blocks_enrollment() {
        let mut wizard = wizard();
        wizard.set_enrollment(enrollment("   "));

        let err = wizard.next().expect_err("blank name must block");

        assert!(matches!(err, IntakeError::Validation(ref e) if e.contains(Field::PatientName)));
        assert_eq!(wizard.step(), WizardStep::Enrollment);
        assert!(wizard.field_errors().contains(Field::PatientName));
    }

    #[test]
    fn field_errors_clear_once_enrollment_passes() {
        let mut wizard = wizard();
        assert!(wizard.next().is_err());
        assert!(!wizard.field_errors().is_empty());

        wizard.set_enrollment(enrollment("Asha Meena"));
        assert_eq!(wizard.next().expect("complete"), WizardStep::ScanOptions);
        assert!(wizard.field_errors().is_empty());
    }

    #[test]
    fn no_scans_blocks_payment() {
        let mut wizard = wizard();
        wizard.set_enrollment(enrollment("Asha Meena"));
        wizard.next().expect("enrollment complete");

        assert!(matches!(wizard.next(), Err(IntakeError::NoScanSelected)));
        assert_eq!(wizard.step(), WizardStep::ScanOptions);
    }

    #[test]
    fn selection_is_priced_per_category() {
        let mut wizard = wizard();
        wizard
            .set_scan_selection([ScanId(1), ScanId(2)])
            .expect("known scans");
        assert_eq!(wizard.draft().total_amount(), Decimal::from(1500));
        assert_eq!(wizard.draft().total_minutes(), 45);

        wizard.set_category("RGHS");
        assert!(wizard.draft().category().is_fee_exempt);
        assert!(wizard.draft().total_amount().is_zero());
        assert_eq!(wizard.draft().gross_amount(), Decimal::from(1500));

        wizard.set_category("GEN / Paid");
        assert_eq!(wizard.draft().total_amount(), Decimal::from(1500));
    }

    #[test]
    fn due_tracks_every_money_change() {
        let mut wizard = wizard();
        wizard
            .set_scan_selection([ScanId(1), ScanId(2)])
            .expect("known scans");
        wizard.set_received_amount(Decimal::from(500)).expect("valid");
        wizard.set_discount_amount(Decimal::from(200)).expect("valid");
        assert_eq!(wizard.draft().due_amount(), Decimal::from(800));

        wizard.deselect_scan(ScanId(2));
        assert_eq!(wizard.draft().due_amount(), Decimal::from(-100));
        assert!(wizard.draft().is_settled());
    }

    #[test]
    fn paid_in_full_is_settled() {
        let mut wizard = wizard();
        wizard.select_scan(ScanId(1)).expect("known scan");
        assert!(!wizard.draft().is_settled());

        wizard.set_received_amount(Decimal::from(600)).expect("valid");
        assert!(wizard.draft().due_amount().is_zero());
        assert!(wizard.draft().is_settled());
    }

    #[test]
    fn oversized_payment_amounts_are_rejected() {
        let mut wizard = wizard();
        let err = wizard
            .set_received_amount(Decimal::MAX)
            .expect_err("beyond the limit");
        assert!(matches!(err, IntakeError::InvalidInput(msg) if msg.contains("out of range")));
        assert!(wizard.set_discount_amount(Decimal::MAX).is_err());
        assert!(wizard.draft().received_amount().is_zero());
        assert!(wizard.draft().due_amount().is_zero());
    }

    #[test]
    fn sub_cent_remainder_counts_as_settled() {
        let mut wizard = wizard();
        wizard.select_scan(ScanId(1)).expect("known scan");
        wizard
            .set_received_amount(Decimal::new(599995, 3))
            .expect("valid");
        assert_eq!(wizard.draft().due_amount(), Decimal::new(5, 3));
        assert!(wizard.draft().is_settled());
    }

    #[test]
    fn negative_payment_amounts_are_rejected() {
        let mut wizard = wizard();
        let err = wizard
            .set_received_amount(Decimal::from(-1))
            .expect_err("negative must fail");
        assert!(matches!(err, IntakeError::InvalidInput(msg) if msg.contains("received")));
        assert!(wizard.set_discount_amount(Decimal::new(-5, 1)).is_err());
        assert!(wizard.draft().received_amount().is_zero());
    }

    #[test]
    fn unknown_scan_is_rejected_without_changing_selection() {
        let mut wizard = wizard();
        wizard.select_scan(ScanId(1)).expect("known scan");

        assert!(matches!(
            wizard.select_scan(ScanId(99)),
            Err(IntakeError::UnknownScan(ScanId(99)))
        ));
        assert!(wizard.set_scan_selection([ScanId(2), ScanId(99)]).is_err());

        let selected: Vec<ScanId> = wizard.draft().selected_scan_ids().iter().copied().collect();
        assert_eq!(selected, vec![ScanId(1)]);
    }

    #[test]
    fn back_keeps_the_draft() {
        let mut wizard = wizard_at_payment();
        wizard.set_received_amount(Decimal::from(100)).expect("valid");

        assert_eq!(wizard.back(), WizardStep::ScanOptions);
        assert_eq!(wizard.back(), WizardStep::Enrollment);
        assert_eq!(wizard.back(), WizardStep::Enrollment);

        assert_eq!(wizard.draft().patient_name(), "Asha Meena");
        assert_eq!(wizard.draft().selected_scan_ids().len(), 2);
        assert_eq!(wizard.draft().received_amount(), Decimal::from(100));
    }

    #[test]
    fn next_at_payment_stays_put() {
        let mut wizard = wizard_at_payment();
        assert_eq!(wizard.next().expect("no-op"), WizardStep::Payment);
    }

    #[test]
    fn go_to_cannot_skip_a_guard() {
        let mut wizard = wizard();
        wizard.set_enrollment(enrollment("Asha Meena"));

        let err = wizard
            .go_to(WizardStep::Payment)
            .expect_err("no scans selected");

        assert!(matches!(err, IntakeError::NoScanSelected));
        assert_eq!(wizard.step(), WizardStep::ScanOptions);
    }

    #[test]
    fn go_to_forward_and_back() {
        let mut wizard = wizard();
        wizard.set_enrollment(enrollment("Asha Meena"));
        wizard.select_scan(ScanId(2)).expect("known scan");

        assert_eq!(
            wizard.go_to(WizardStep::Payment).expect("guards pass"),
            WizardStep::Payment
        );
        assert_eq!(
            wizard.go_to(WizardStep::Enrollment).expect("back is free"),
            WizardStep::Enrollment
        );
    }

    #[test]
    fn step_names_parse() {
        assert_eq!(
            "scan_options".parse::<WizardStep>().ok(),
            Some(WizardStep::ScanOptions)
        );
        assert_eq!(" Payment ".parse::<WizardStep>().ok(), Some(WizardStep::Payment));
        assert!("review".parse::<WizardStep>().is_err());
        assert_eq!(WizardStep::ScanOptions.to_string(), "scan_options");
    }

    #[tokio::test]
    async fn mount_loads_reference_data() {
        let mut wizard = RegistrationWizard::new(Arc::new(CategoryTable::default()));
        let directory = FakeDirectory {
            scans: catalog(),
            fail: false,
        };

        wizard.mount(&directory).await.expect("mount");

        assert_eq!(wizard.hospitals().len(), 1);
        assert_eq!(wizard.doctors()[0].name, "Dr Rao");
        assert_eq!(wizard.catalog().len(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_catalog() {
        let mut wizard = wizard();
        wizard.select_scan(ScanId(1)).expect("known scan");
        let directory = FakeDirectory {
            scans: Vec::new(),
            fail: true,
        };

        assert!(wizard.refresh_catalog(&directory).await.is_err());
        assert!(wizard.mount(&directory).await.is_err());

        assert_eq!(wizard.catalog(), catalog().as_slice());
        assert_eq!(wizard.draft().total_amount(), Decimal::from(600));
    }

    #[tokio::test]
    async fn refresh_reprices_the_selection() {
        let mut wizard = wizard();
        wizard.select_scan(ScanId(1)).expect("known scan");
        let directory = FakeDirectory {
            scans: vec![
                ScanOption::new(1u64, "X-Ray Chest", Decimal::from(650), 15).expect("valid"),
            ],
            fail: false,
        };

        wizard.refresh_catalog(&directory).await.expect("refresh");

        assert_eq!(wizard.draft().total_amount(), Decimal::from(650));
    }

    #[tokio::test]
    async fn submit_success_resets_the_wizard() {
        let mut wizard = wizard_at_payment();
        wizard.set_received_amount(Decimal::from(500)).expect("valid");
        wizard.set_discount_amount(Decimal::from(200)).expect("valid");
        let store = FakeStore::default();
        let sequence = CroSequence::default();

        let confirmation = wizard.submit(&store, &sequence).await.expect("submit");

        assert!(confirmation.cro.starts_with("CRO-"));
        assert_eq!(confirmation.record_id.as_deref(), Some("42"));
        assert_eq!(wizard.step(), WizardStep::Enrollment);
        assert!(wizard.draft().patient_name().is_empty());
        assert!(wizard.draft().selected_scan_ids().is_empty());
        assert_eq!(wizard.catalog().len(), 2);

        let received = store.received.lock().expect("store lock");
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].scan_type, "1,2");
        assert_eq!(received[0].total_amount, Decimal::from(1500));
        assert_eq!(received[0].due_amount, Decimal::from(800));
    }

    #[tokio::test]
    async fn submit_failure_keeps_draft_and_step() {
        let mut wizard = wizard_at_payment();
        let store = FakeStore {
            fail: true,
            ..FakeStore::default()
        };
        let sequence = CroSequence::default();

        let err = wizard
            .submit(&store, &sequence)
            .await
            .expect_err("store fails");

        assert!(err.is_collaborator());
        assert_eq!(wizard.step(), WizardStep::Payment);
        assert_eq!(wizard.draft().patient_name(), "Asha Meena");
        assert_eq!(wizard.draft().total_amount(), Decimal::from(1500));
    }

    #[tokio::test]
    async fn submit_outside_payment_is_rejected() {
        let mut wizard = wizard();
        let store = FakeStore::default();

        let err = wizard
            .submit(&store, &CroSequence::default())
            .await
            .expect_err("not at payment");

        assert!(matches!(
            err,
            IntakeError::NotAtPaymentStep(WizardStep::Enrollment)
        ));
        assert!(store.received.lock().expect("store lock").is_empty());
    }

    #[tokio::test]
    async fn submit_rechecks_the_guards() {
        let mut wizard = wizard_at_payment();
        wizard.deselect_scan(ScanId(1));
        wizard.deselect_scan(ScanId(2));
        let store = FakeStore::default();

        let err = wizard
            .submit(&store, &CroSequence::default())
            .await
            .expect_err("no scans");

        assert!(matches!(err, IntakeError::NoScanSelected));
        assert_eq!(wizard.step(), WizardStep::Payment);
    }

    #[tokio::test]
    async fn consecutive_submits_get_increasing_cro_numbers() {
        let store = FakeStore::default();
        let sequence = CroSequence::default();

        let mut first = wizard_at_payment();
        let a = first.submit(&store, &sequence).await.expect("first");
        let mut second = wizard_at_payment();
        let b = second.submit(&store, &sequence).await.expect("second");

        let a: CroNumber = a.cro.parse().expect("valid cro");
        let b: CroNumber = b.cro.parse().expect("valid cro");
        assert!(b > a);
    }
}
