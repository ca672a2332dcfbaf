pub mod document_repository;
pub mod document_service;
pub mod gateway;
pub mod gemini;
pub mod normalizer;
pub mod scheme_repository;
pub mod scheme_service;
pub mod storage;
