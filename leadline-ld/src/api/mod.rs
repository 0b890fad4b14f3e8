//! HTTP API handlers

pub mod agents;
pub mod health;
pub mod lists;
pub mod owner;

pub use owner::OwnerId;

use serde::Serialize;

/// Standard collection response envelope
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}
