// ドメイン層
// 予約リクエストのライフサイクルと競合判定のビジネスルール

pub mod error;
pub mod model;
pub mod port;
pub mod service;
