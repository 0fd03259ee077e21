//! # daasim
//!
//! 2機間の衝突検知と協調的な回避解の合成を行うライブラリです。
//!
//! - [`geometry`]: ベクトル、許容誤差付き比較、単位変換
//! - [`detection`]: 水平・垂直ソルバーと保護領域ごとの検知器
//! - [`resolution`]: 協調判定と回避解の合成
//! - [`scenario`] / [`runner`]: 遭遇シナリオの読み込みと評価
//!
//! 内部単位は m, s, rad, m/s です。

pub mod detection;
pub mod geometry;
pub mod logging;
pub mod resolution;
pub mod runner;
pub mod scenario;
