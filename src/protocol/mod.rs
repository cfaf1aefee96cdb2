//! Wire formats of the store and CAPTCHA providers.

pub mod models;
