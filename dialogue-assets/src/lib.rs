//! # Dialogue Assets
//!
//! 对话引擎的资源解析库：符号资源名 → 磁盘路径。
//!
//! ## 架构概述
//!
//! 四个固定类别（背景、音乐、音效、立绘）各有基础目录和按优先级
//! 排列的扩展名。解析带类型化回退规则（立绘有 `角色_情绪` 回退链），
//! 结果按 `(类别, 名称)` 缓存。存储访问通过 [`AssetSource`] 抽象，
//! 便于测试注入替身。
//!
//! ## 目录约定（相对于资源根目录）
//!
//! ```text
//! backgrounds/      背景图
//! music/            背景音乐
//! soundEffects/     音效
//! portraits/        立绘（可按角色分子目录）
//! ```
//!
//! ## 使用示例
//!
//! ```ignore
//! use dialogue_assets::{AssetCategory, AssetResolver, FsSource};
//!
//! let mut resolver = AssetResolver::new(Box::new(FsSource::new("assets")));
//! let path = resolver.resolve(AssetCategory::Background, "forest");
//! let portrait = resolver.resolve_portrait("Hero", "happy");
//! ```

pub mod error;
pub mod resolver;
pub mod source;

pub use error::AssetError;
pub use resolver::{AssetCategory, AssetResolver, NEUTRAL_EMOTION};
pub use source::{AssetSource, FsSource};
