/// API route handlers
///
/// - `health`: Health check endpoint
/// - `projects`: Organization project listing, detail and latest releases

pub mod health;
pub mod projects;
