//! Generate temporary AWS Management Console sign-in URLs.
//!
//! Temporary role credentials are exchanged for a federation sign-in token at
//! `https://signin.aws.amazon.com/federation`, which is then embedded in a
//! browser-usable login URL. See [`aws::FederationClient`].

pub mod aws;
pub mod browser;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod prompt;

pub use aws::{Credentials, FederationClient, FederationConfig, SessionDuration, SigninToken};
pub use error::{FederationError, FederationResult};
