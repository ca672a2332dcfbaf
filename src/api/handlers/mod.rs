pub mod documents;
pub mod health;
pub mod schemes;
pub mod verify;
