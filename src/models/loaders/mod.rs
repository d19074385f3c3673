pub mod pdf_loader;

pub use pdf_loader::scan_pdf_folder;
