//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Translate external request parameters into query specs.

pub mod member_service;

pub use member_service::{MemberService, MemberServiceError, PageParams, PagingDefaults};
