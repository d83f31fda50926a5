//! Kabosuのテストモジュール群
//!
//! トライと辞書それぞれの結合動作を検証するテストを含みます。
