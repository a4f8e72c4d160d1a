//! # ミドルウェア
//!
//! - [`client_ip`]: クライアント IP の抽出

pub mod client_ip;

pub use client_ip::{ClientIp, extract_client_ip};
