pub mod diagnosis;
pub mod evolution;
pub mod lab;
pub mod medication;
pub mod procedure;
pub mod record;

pub use diagnosis::Diagnosis;
pub use evolution::EvolutionNote;
pub use lab::LabResult;
pub use medication::Medication;
pub use procedure::Procedure;
pub use record::{ClinicalRecord, DischargeInstructions};
