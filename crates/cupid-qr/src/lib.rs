pub mod code;
pub mod compose;
pub mod font;

pub use code::generate_code;
pub use compose::{QrError, QrOptions, render_qr, render_qr_base64};
pub use qrcode::EcLevel;
