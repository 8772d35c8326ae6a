//! # Resolver 模块
//!
//! 符号资源名到磁盘路径的解析，带类型化回退规则和结果缓存。
//!
//! ## 解析算法
//!
//! 1. 名称含路径分隔符 → 按项目相对路径直接检查
//! 2. 否则按类别目录逐扩展名尝试 `<dir>/<name><ext>`，先到先得
//! 3. 否则在类别目录内做忽略扩展名的大小写不敏感匹配
//! 4. 立绘额外搜索一层子目录
//!
//! 每个 `(类别, 名称)` 的结果（命中或未命中）都会被缓存，
//! 重复查询不再触碰存储。缓存是实例私有的，单线程访问，无需加锁。

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, trace};

use crate::source::AssetSource;

/// 默认情绪名
pub const NEUTRAL_EMOTION: &str = "neutral";

/// 资源类别
///
/// 每个类别有固定的基础目录和按优先级排列的可接受扩展名。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    /// 背景图
    Background,
    /// 背景音乐
    Music,
    /// 音效
    SoundEffect,
    /// 立绘
    Portrait,
}

impl AssetCategory {
    /// 全部类别
    pub const ALL: [AssetCategory; 4] = [
        AssetCategory::Background,
        AssetCategory::Music,
        AssetCategory::SoundEffect,
        AssetCategory::Portrait,
    ];

    /// 类别基础目录（相对于资源根目录）
    pub fn base_dir(self) -> &'static str {
        match self {
            Self::Background => "backgrounds",
            Self::Music => "music",
            Self::SoundEffect => "soundEffects",
            Self::Portrait => "portraits",
        }
    }

    /// 可接受的扩展名（按优先级）
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Background => &[".png", ".jpg", ".jpeg", ".webp"],
            Self::Music => &[".ogg", ".mp3", ".wav", ".flac"],
            Self::SoundEffect => &[".ogg", ".wav", ".mp3", ".flac"],
            Self::Portrait => &[".png", ".webp", ".jpg"],
        }
    }
}

/// 资源解析器
///
/// 通过注入的 [`AssetSource`] 访问存储；解析结果按
/// `(类别, 名称)` 缓存，命中与未命中同样缓存。
pub struct AssetResolver {
    /// 存储访问接口
    source: Box<dyn AssetSource>,
    /// 解析结果缓存
    cache: HashMap<(AssetCategory, String), Option<String>>,
}

impl AssetResolver {
    /// 创建资源解析器
    pub fn new(source: Box<dyn AssetSource>) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    /// 解析符号资源名为逻辑路径
    ///
    /// 找不到时返回 `None`（不是错误）。结果被缓存，
    /// 对同一 `(category, name)` 的重复查询不会再触碰存储。
    pub fn resolve(&mut self, category: AssetCategory, name: &str) -> Option<String> {
        let key = (category, name.to_string());
        if let Some(cached) = self.cache.get(&key) {
            trace!(?category, %name, "资源解析缓存命中");
            return cached.clone();
        }

        let result = self.resolve_uncached(category, name);
        match &result {
            Some(path) => debug!(?category, %name, %path, "资源解析成功"),
            None => debug!(?category, %name, "资源未找到"),
        }
        self.cache.insert(key, result.clone());
        result
    }

    /// 清空解析缓存（资源目录变化后调用）
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// 解析立绘
    ///
    /// 回退链：`<character>_<emotion>`（情绪为 neutral 时跳过）→
    /// `<character>_neutral` → `<character>`，先解析到的生效。
    pub fn resolve_portrait(&mut self, character: &str, emotion: &str) -> Option<String> {
        if !emotion.eq_ignore_ascii_case(NEUTRAL_EMOTION)
            && let Some(path) =
                self.resolve(AssetCategory::Portrait, &format!("{}_{}", character, emotion))
        {
            return Some(path);
        }

        if let Some(path) = self.resolve(
            AssetCategory::Portrait,
            &format!("{}_{}", character, NEUTRAL_EMOTION),
        ) {
            return Some(path);
        }

        self.resolve(AssetCategory::Portrait, character)
    }

    /// 列出类别下全部资源主干名（去重、排序）
    ///
    /// 立绘类别包含一层子目录中的条目。
    pub fn list_assets(&self, category: AssetCategory) -> Vec<String> {
        let dir = category.base_dir();
        let mut stems: BTreeSet<String> = self
            .source
            .list_files(dir)
            .iter()
            .map(|file| stem_of(file).to_string())
            .collect();

        if category == AssetCategory::Portrait {
            for sub in self.source.list_dirs(dir) {
                let sub_dir = format!("{}/{}", dir, sub);
                stems.extend(
                    self.source
                        .list_files(&sub_dir)
                        .iter()
                        .map(|file| stem_of(file).to_string()),
                );
            }
        }

        stems.into_iter().collect()
    }

    /// 按角色分组列出立绘及其情绪后缀
    ///
    /// 主干名在第一个 `_` 处拆分为（角色, 情绪）；
    /// 没有 `_` 的主干名归入情绪 `neutral`。
    pub fn list_portraits(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for stem in self.list_assets(AssetCategory::Portrait) {
            let (character, emotion) = match stem.split_once('_') {
                Some((character, emotion)) => (character.to_string(), emotion.to_string()),
                None => (stem, NEUTRAL_EMOTION.to_string()),
            };
            grouped.entry(character).or_default().insert(emotion);
        }

        grouped
            .into_iter()
            .map(|(character, emotions)| (character, emotions.into_iter().collect()))
            .collect()
    }

    // ------------------------------------------------------------------
    // 内部实现
    // ------------------------------------------------------------------

    fn resolve_uncached(&self, category: AssetCategory, name: &str) -> Option<String> {
        // 1. 含路径分隔符：按项目相对路径直接检查
        if name.contains('/') || name.contains('\\') {
            let logical = name.replace('\\', "/");
            return self.source.exists(&logical).then_some(logical);
        }

        let dir = category.base_dir();

        // 2. 逐扩展名尝试，先到先得
        for ext in category.extensions() {
            let candidate = format!("{}/{}{}", dir, name, ext);
            if self.source.exists(&candidate) {
                return Some(candidate);
            }
        }

        // 3. 目录内忽略扩展名的大小写不敏感匹配
        if let Some(found) = self.match_in_dir(dir, name) {
            return Some(found);
        }

        // 4. 立绘额外搜索一层子目录
        if category == AssetCategory::Portrait {
            for sub in self.source.list_dirs(dir) {
                let sub_dir = format!("{}/{}", dir, sub);
                if let Some(found) = self.match_in_dir(&sub_dir, name) {
                    return Some(found);
                }
            }
        }

        None
    }

    /// 目录内的大小写不敏感主干名匹配
    fn match_in_dir(&self, dir: &str, name: &str) -> Option<String> {
        let lower = name.to_lowercase();
        for file in self.source.list_files(dir) {
            if stem_of(&file).to_lowercase() == lower {
                return Some(format!("{}/{}", dir, file));
            }
        }
        None
    }
}

/// 文件名主干（最后一个 `.` 之前的部分）
fn stem_of(file: &str) -> &str {
    match file.rfind('.') {
        Some(pos) => &file[..pos],
        None => file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetError;
    use std::cell::Cell;
    use std::rc::Rc;

    /// 统计存储访问次数的来源替身
    struct StubSource {
        /// 逻辑路径全集
        files: Vec<&'static str>,
        /// 存储访问计数（exists / list_files / list_dirs 各记一次）
        calls: Rc<Cell<usize>>,
    }

    impl StubSource {
        fn new(files: Vec<&'static str>) -> (Self, Rc<Cell<usize>>) {
            let calls = Rc::new(Cell::new(0));
            (
                Self {
                    files,
                    calls: calls.clone(),
                },
                calls,
            )
        }

        fn touch(&self) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    impl AssetSource for StubSource {
        fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
            self.touch();
            Err(AssetError::LoadFailed {
                path: path.to_string(),
                message: "stub".to_string(),
            })
        }

        fn exists(&self, path: &str) -> bool {
            self.touch();
            self.files.contains(&path)
        }

        fn list_files(&self, dir: &str) -> Vec<String> {
            self.touch();
            let prefix = format!("{}/", dir);
            let mut files: Vec<String> = self
                .files
                .iter()
                .filter_map(|f| f.strip_prefix(&prefix))
                .filter(|rest| !rest.contains('/'))
                .map(String::from)
                .collect();
            files.sort();
            files
        }

        fn list_dirs(&self, dir: &str) -> Vec<String> {
            self.touch();
            let prefix = format!("{}/", dir);
            let mut dirs: Vec<String> = self
                .files
                .iter()
                .filter_map(|f| f.strip_prefix(&prefix))
                .filter_map(|rest| rest.split_once('/').map(|(sub, _)| sub.to_string()))
                .collect();
            dirs.sort();
            dirs.dedup();
            dirs
        }
    }

    fn make_resolver(files: Vec<&'static str>) -> (AssetResolver, Rc<Cell<usize>>) {
        let (source, calls) = StubSource::new(files);
        (AssetResolver::new(Box::new(source)), calls)
    }

    #[test]
    fn test_extension_priority_order() {
        // png 在 jpg 之前
        let (mut resolver, _) = make_resolver(vec![
            "backgrounds/forest.jpg",
            "backgrounds/forest.png",
        ]);

        assert_eq!(
            resolver.resolve(AssetCategory::Background, "forest"),
            Some("backgrounds/forest.png".to_string())
        );
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let (mut resolver, _) = make_resolver(vec!["backgrounds/Forest.PNG"]);

        assert_eq!(
            resolver.resolve(AssetCategory::Background, "forest"),
            Some("backgrounds/Forest.PNG".to_string())
        );
    }

    #[test]
    fn test_direct_path_with_separator() {
        let (mut resolver, _) = make_resolver(vec!["backgrounds/forest.png"]);

        assert_eq!(
            resolver.resolve(AssetCategory::Background, "backgrounds/forest.png"),
            Some("backgrounds/forest.png".to_string())
        );
        // 含分隔符但不存在：不再走类别目录回退
        assert_eq!(
            resolver.resolve(AssetCategory::Background, "other/forest.png"),
            None
        );
    }

    #[test]
    fn test_portrait_subdirectory_search() {
        let (mut resolver, _) = make_resolver(vec!["portraits/Hero/Hero_happy.png"]);

        assert_eq!(
            resolver.resolve(AssetCategory::Portrait, "Hero_happy"),
            Some("portraits/Hero/Hero_happy.png".to_string())
        );
    }

    #[test]
    fn test_subdirectories_only_searched_for_portraits() {
        let (mut resolver, _) = make_resolver(vec!["backgrounds/town/square.png"]);

        assert_eq!(resolver.resolve(AssetCategory::Background, "square"), None);
    }

    #[test]
    fn test_portrait_fallback_chain() {
        let (mut resolver, _) = make_resolver(vec!["portraits/Hero_neutral.png"]);

        // Hero_happy 不存在，回退到 Hero_neutral
        assert_eq!(
            resolver.resolve_portrait("Hero", "happy"),
            Some("portraits/Hero_neutral.png".to_string())
        );

        // 情绪为 neutral 时直接从 Hero_neutral 开始
        assert_eq!(
            resolver.resolve_portrait("Hero", "neutral"),
            Some("portraits/Hero_neutral.png".to_string())
        );
    }

    #[test]
    fn test_portrait_bare_character_fallback() {
        let (mut resolver, _) = make_resolver(vec!["portraits/Guide.png"]);

        assert_eq!(
            resolver.resolve_portrait("Guide", "happy"),
            Some("portraits/Guide.png".to_string())
        );
    }

    #[test]
    fn test_cache_prevents_repeated_storage_access() {
        let (mut resolver, calls) = make_resolver(vec!["portraits/Hero_neutral.png"]);

        let first = resolver.resolve_portrait("Hero", "happy");
        let calls_after_first = calls.get();
        assert!(calls_after_first > 0);

        // 第二次完全相同的查询只读缓存
        let second = resolver.resolve_portrait("Hero", "happy");
        assert_eq!(first, second);
        assert_eq!(calls.get(), calls_after_first);
    }

    #[test]
    fn test_not_found_is_also_cached() {
        let (mut resolver, calls) = make_resolver(vec![]);

        assert_eq!(resolver.resolve(AssetCategory::Music, "theme"), None);
        let calls_after_first = calls.get();

        assert_eq!(resolver.resolve(AssetCategory::Music, "theme"), None);
        assert_eq!(calls.get(), calls_after_first);

        // 清空缓存后重新触碰存储
        resolver.clear_cache();
        assert_eq!(resolver.resolve(AssetCategory::Music, "theme"), None);
        assert!(calls.get() > calls_after_first);
    }

    #[test]
    fn test_list_assets_sorted_and_deduplicated() {
        let (resolver, _) = make_resolver(vec![
            "music/theme.ogg",
            "music/theme.mp3",
            "music/battle.ogg",
        ]);

        assert_eq!(
            resolver.list_assets(AssetCategory::Music),
            vec!["battle".to_string(), "theme".to_string()]
        );
    }

    #[test]
    fn test_list_portraits_grouping() {
        let (resolver, _) = make_resolver(vec![
            "portraits/Hero_happy.png",
            "portraits/Hero_neutral.png",
            "portraits/Guide.png",
            "portraits/Hero/Hero_angry.png",
        ]);

        let grouped = resolver.list_portraits();

        assert_eq!(
            grouped.get("Hero"),
            Some(&vec![
                "angry".to_string(),
                "happy".to_string(),
                "neutral".to_string()
            ])
        );
        // 无 `_` 的主干名归入 neutral
        assert_eq!(grouped.get("Guide"), Some(&vec!["neutral".to_string()]));
    }
}
