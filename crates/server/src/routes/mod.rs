pub mod auth;
pub mod health;
pub mod management;
pub mod milestones;
pub mod profile;
pub mod projects;
pub mod resumes;
pub mod roles;
pub mod tasks;
pub mod teams;
