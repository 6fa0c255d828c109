pub(crate) mod auth;
pub(crate) mod storage;
pub(crate) mod system;
pub(crate) mod todos;
