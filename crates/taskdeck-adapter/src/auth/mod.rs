/*
[INPUT]:  Bearer token issued by the external login flow
[OUTPUT]: Shared token store consulted on every request
[POS]:    Auth layer - handles Task Service authentication
[UPDATE]: When auth storage or token lifecycle changes
*/

pub mod token;

pub use token::{TokenData, TokenStore};
