pub mod prelude;

pub mod schemes;
pub mod user_documents;
