pub mod crop_box;
pub mod loaders;
pub mod question;

pub use crop_box::{
    reference_page_number, BoxKind, CalibratedRegions, CalibrationConfig, CropBox, RENDER_SCALE,
};
pub use loaders::scan_pdf_folder;
pub use question::{AnswerLetter, Question, Test, QUESTION_PLACEHOLDER};
