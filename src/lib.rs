#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "A multi-tenant task-tracking API: users create task lists, tasks within"]
#![doc = "them, and comments on tasks, with ownership- and role-based access control."]
#![doc = "This crate contains the domain models, authentication and authorization"]
#![doc = "machinery, mail transport, routing configuration, and error handling; the"]
#![doc = "main binary (`main.rs`) assembles and runs the application."]

pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod perms;
pub mod routes;
