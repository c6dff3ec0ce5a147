pub mod errors;
pub mod db;
pub mod tenant;
pub mod user;
pub mod project;
pub mod role;
pub mod member;
pub mod channel;
pub mod field;
pub mod api_key;
pub mod feedback;
pub mod issue;
pub mod feedback_issue;
pub mod history;

#[cfg(test)]
mod tests;
