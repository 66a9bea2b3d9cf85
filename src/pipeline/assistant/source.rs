use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;

use crate::models::*;

use super::AssistantError;

/// Read access to the stored records of one patient.
///
/// Implementations wrap whatever persistence the host uses. Lists may come back in
/// any order; the assistant sorts them itself.
pub trait PatientRecordSource {
    /// `None` when the patient does not exist.
    fn demographics(
        &self,
        patient_id: &str,
    ) -> impl Future<Output = Result<Option<Demographics>, AssistantError>> + Send;

    fn chat_history(
        &self,
        patient_id: &str,
    ) -> impl Future<Output = Result<Vec<ChatTurn>, AssistantError>> + Send;

    fn vitals(
        &self,
        patient_id: &str,
    ) -> impl Future<Output = Result<Vec<VitalSign>, AssistantError>> + Send;

    fn labs(
        &self,
        patient_id: &str,
    ) -> impl Future<Output = Result<Vec<LabResult>, AssistantError>> + Send;

    fn imaging(
        &self,
        patient_id: &str,
    ) -> impl Future<Output = Result<Vec<ImagingResult>, AssistantError>> + Send;

    fn medical_history(
        &self,
        patient_id: &str,
    ) -> impl Future<Output = Result<Option<MedicalHistory>, AssistantError>> + Send;
}

/// Write side of the conversation store: where the calling layer persists a finished turn.
pub trait ChatTurnSink {
    fn append_turns(
        &self,
        patient_id: &str,
        turns: Vec<ChatTurn>,
    ) -> impl Future<Output = Result<(), AssistantError>> + Send;
}

/// Everything stored for one patient.
#[derive(Debug, Clone, Default)]
pub struct PatientRecords {
    pub demographics: Demographics,
    pub chat_history: Vec<ChatTurn>,
    pub vitals: Vec<VitalSign>,
    pub labs: Vec<LabResult>,
    pub imaging: Vec<ImagingResult>,
    pub medical_history: Option<MedicalHistory>,
}

/// Process-local record source for embedding hosts and tests.
#[derive(Debug, Default)]
pub struct InMemoryRecordSource {
    patients: RwLock<HashMap<String, PatientRecords>>,
}

impl InMemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patient(self, patient_id: &str, records: PatientRecords) -> Self {
        if let Ok(mut patients) = self.patients.write() {
            patients.insert(patient_id.to_string(), records);
        }
        self
    }

    pub fn insert(&self, patient_id: &str, records: PatientRecords) -> Result<(), AssistantError> {
        let mut patients = self
            .patients
            .write()
            .map_err(|_| AssistantError::RecordSource("record store lock poisoned".into()))?;
        patients.insert(patient_id.to_string(), records);
        Ok(())
    }

    fn push_turns(
        &self,
        patient_id: &str,
        turns: impl IntoIterator<Item = ChatTurn>,
    ) -> Result<(), AssistantError> {
        let mut patients = self
            .patients
            .write()
            .map_err(|_| AssistantError::RecordSource("record store lock poisoned".into()))?;
        let records = patients
            .get_mut(patient_id)
            .ok_or_else(|| AssistantError::PatientNotFound(patient_id.to_string()))?;
        records.chat_history.extend(turns);
        Ok(())
    }

    fn read<T>(
        &self,
        patient_id: &str,
        select: impl FnOnce(&PatientRecords) -> T,
    ) -> Result<Option<T>, AssistantError> {
        let patients = self
            .patients
            .read()
            .map_err(|_| AssistantError::RecordSource("record store lock poisoned".into()))?;
        Ok(patients.get(patient_id).map(select))
    }
}

impl PatientRecordSource for InMemoryRecordSource {
    async fn demographics(&self, patient_id: &str) -> Result<Option<Demographics>, AssistantError> {
        self.read(patient_id, |r| r.demographics.clone())
    }

    async fn chat_history(&self, patient_id: &str) -> Result<Vec<ChatTurn>, AssistantError> {
        Ok(self
            .read(patient_id, |r| r.chat_history.clone())?
            .unwrap_or_default())
    }

    async fn vitals(&self, patient_id: &str) -> Result<Vec<VitalSign>, AssistantError> {
        Ok(self.read(patient_id, |r| r.vitals.clone())?.unwrap_or_default())
    }

    async fn labs(&self, patient_id: &str) -> Result<Vec<LabResult>, AssistantError> {
        Ok(self.read(patient_id, |r| r.labs.clone())?.unwrap_or_default())
    }

    async fn imaging(&self, patient_id: &str) -> Result<Vec<ImagingResult>, AssistantError> {
        Ok(self.read(patient_id, |r| r.imaging.clone())?.unwrap_or_default())
    }

    async fn medical_history(
        &self,
        patient_id: &str,
    ) -> Result<Option<MedicalHistory>, AssistantError> {
        Ok(self
            .read(patient_id, |r| r.medical_history.clone())?
            .flatten())
    }
}

impl ChatTurnSink for InMemoryRecordSource {
    async fn append_turns(&self, patient_id: &str, turns: Vec<ChatTurn>) -> Result<(), AssistantError> {
        self.push_turns(patient_id, turns)
    }
}
