pub mod labels;
pub mod reuters;
pub mod vectorize;

pub use crate::labels::LabelEncoder;
pub use crate::reuters::*;
pub use crate::vectorize::Vectorizer;
