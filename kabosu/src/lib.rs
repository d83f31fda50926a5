//! # Kabosu
//!
//! Kabosuは、形態素解析のためのバイナリ辞書エンジンです。
//!
//! ## 概要
//!
//! このライブラリは、ダブル配列トライによる見出し語の索引と、品詞や
//! 接続コストなどの文法情報、そして語の詳細情報をひとつのバイナリ辞書として
//! 読み書きします。辞書はメモリマップでゼロコピーに開け、システム辞書に
//! ユーザー辞書を重ねて引けます。
//!
//! ## 主な機能
//!
//! - **ダブル配列トライ**: DAWG経由の構築と完全一致・前方一致検索
//! - **バイナリ辞書**: ヘッダー、文法、語彙の読み書きと形式検証
//! - **辞書の重ね合わせ**: システム辞書と最大15個のユーザー辞書の合成
//! - **プログラムからの構築**: メモリ上のエントリ列からの辞書生成
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use kabosu::dictionary::build::{ConnectionMatrix, RawWordEntry, SystemDictionaryBuilder};
//! use kabosu::dictionary::grammar::Pos;
//! use kabosu::BinaryDictionary;
//!
//! let entries = vec![RawWordEntry {
//!     surface: "京都".to_string(),
//!     left_id: 0,
//!     right_id: 0,
//!     cost: 5293,
//!     pos: Pos::new(vec![
//!         "名詞".to_string(),
//!         "固有名詞".to_string(),
//!         "地名".to_string(),
//!         "一般".to_string(),
//!         "*".to_string(),
//!         "*".to_string(),
//!     ])?,
//!     reading_form: "キョウト".to_string(),
//!     ..Default::default()
//! }];
//! let matrix = ConnectionMatrix::new(1, 1, vec![0])?;
//! let bytes = SystemDictionaryBuilder::build(&entries, &matrix, "例")?;
//!
//! let dict = BinaryDictionary::from_vec(bytes)?;
//! let lexicon = dict.lexicon()?;
//! let entry = lexicon.lookup("京都".as_bytes(), 0).next().unwrap();
//! let info = lexicon.word_info(entry.word_id)?;
//! assert_eq!(info.surface(), "京都");
//! assert_eq!(info.reading_form(), "キョウト");
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

/// 辞書データ構造とビルダー
pub mod dictionary;

/// エラー型の定義
pub mod errors;

/// ダブル配列トライ
pub mod trie;

/// 内部ユーティリティ
mod utils;

#[cfg(test)]
mod tests;

// Re-exports
pub use dictionary::build::{SystemDictionaryBuilder, UserDictionaryBuilder};
pub use dictionary::lexicon_set::LexiconSet;
pub use dictionary::BinaryDictionary;
pub use trie::DoubleArray;

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
