// 予約リクエストサービス
// 宿泊予約リクエストのライフサイクルと競合解決

pub mod adapter;
pub mod application;
pub mod domain;
