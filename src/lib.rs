pub mod attachment;
pub mod document;
pub mod error;
pub mod info;
pub mod math;
pub mod projection;
pub mod reader;
pub mod selection;
pub mod subset;
pub mod topology;
pub mod writer;

pub use attachment::{AttachmentRegistry, ElementKind};
pub use error::{Result, UgxError};
pub use info::FileInfo;
pub use reader::{GridReader, ReaderOptions};
pub use topology::Grid;
pub use writer::GridWriter;
