//! Application services: serializers, attachment links and the catalogue.

pub mod attachments;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod pagination;
pub mod repos;
pub mod serializers;
