pub(crate) mod leftover_report;
pub(crate) mod paper_composer;
pub(crate) mod paper_document;
pub(crate) mod paper_draft;
pub(crate) mod paper_errors;
pub(crate) mod paper_finalize;
pub(crate) mod paper_validator;
pub(crate) mod question_bank;
pub(crate) mod question_generation;
