pub use super::schemes::Entity as Schemes;
pub use super::user_documents::Entity as UserDocuments;
