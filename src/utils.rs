use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;
use walkdir::WalkDir;

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 解析逗号分隔的文件类型列表，忽略空项和前导点
pub fn parse_file_types(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().trim_start_matches('.'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// 扩展名是否在类型列表中；列表为空表示不过滤
pub fn matches_file_type(path: &Path, types: &[String]) -> bool {
    if types.is_empty() {
        return true;
    }
    path.extension()
        .map(|ext| types.iter().any(|t| ext.to_string_lossy() == t.as_str()))
        .unwrap_or(false)
}

/// 过滤文件列表，只返回匹配指定扩展名的文件
pub fn filter_files_by_types(files: Vec<PathBuf>, types: &[String]) -> Vec<PathBuf> {
    if types.is_empty() {
        warn!("警告: 文件类型列表为空，返回所有文件");
        return files;
    }
    files
        .into_iter()
        .filter(|path| matches_file_type(path, types))
        .collect()
}

/// 递归收集目录下匹配类型的文件，按路径排序
pub fn collect_dir_files(dir: &Path, types: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("输入目录不存在: {}", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("遍历目录失败: {}", dir.display()))?;
        if entry.file_type().is_file() && matches_file_type(entry.path(), types) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// 生成输出文件路径
///
/// 位于 `input_dir` 下的文件保持目录结构：
/// `output_dir/<input_dir名>/<相对目录>/<名称>_translated.<扩展名>`；
/// 其他文件直接放在 `output_dir` 下。
pub fn generate_output_path(input: &Path, input_dir: Option<&Path>, output_dir: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let translated_name = match input.extension() {
        Some(ext) => format!("{}_translated.{}", stem, ext.to_string_lossy()),
        None => format!("{}_translated", stem),
    };

    let nested = input_dir.and_then(|dir| {
        let relative_parent = input.strip_prefix(dir).ok()?.parent()?;
        let dir_name = dir.file_name()?;
        Some(output_dir.join(dir_name).join(relative_parent))
    });

    nested
        .unwrap_or_else(|| output_dir.to_path_buf())
        .join(translated_name)
}

/// 直接输入的文本（参数或stdin）的输出路径
pub fn inline_output_path(identifier: &str, output_dir: &Path) -> PathBuf {
    let safe: String = identifier
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    output_dir.join(format!("translated_{}.txt", safe))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_file_types() {
        assert_eq!(parse_file_types("txt, .md,,"), vec!["txt", "md"]);
        assert!(parse_file_types(" , ").is_empty());
    }

    #[test]
    fn test_filter_files_by_types() {
        let files = vec![
            PathBuf::from("a.txt"),
            PathBuf::from("b.md"),
            PathBuf::from("c.rs"),
            PathBuf::from("README"),
        ];
        let types = vec!["txt".to_string(), "md".to_string()];

        let filtered = filter_files_by_types(files.clone(), &types);
        assert_eq!(filtered, vec![PathBuf::from("a.txt"), PathBuf::from("b.md")]);

        assert_eq!(filter_files_by_types(files.clone(), &[]), files);
    }

    #[test]
    fn test_collect_dir_files_recurses() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("sub/b.txt"), "b").unwrap();
        fs::write(dir.path().join("sub/deeper/c.md"), "c").unwrap();
        fs::write(dir.path().join("sub/skip.rs"), "d").unwrap();

        let types = vec!["txt".to_string(), "md".to_string()];
        let files = collect_dir_files(dir.path(), &types).unwrap();

        assert_eq!(
            files,
            vec![
                dir.path().join("a.txt"),
                dir.path().join("sub/b.txt"),
                dir.path().join("sub/deeper/c.md"),
            ]
        );
    }

    #[test]
    fn test_collect_dir_files_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(collect_dir_files(&dir.path().join("nope"), &[]).is_err());
    }

    #[test]
    fn test_output_path_keeps_directory_structure() {
        let out = Path::new("translated");
        let input_dir = Path::new("/data/docs");

        assert_eq!(
            generate_output_path(Path::new("/data/docs/guide/intro.md"), Some(input_dir), out),
            PathBuf::from("translated/docs/guide/intro_translated.md")
        );
        assert_eq!(
            generate_output_path(Path::new("/data/docs/top.txt"), Some(input_dir), out),
            PathBuf::from("translated/docs/top_translated.txt")
        );
    }

    #[test]
    fn test_output_path_for_loose_files() {
        let out = Path::new("translated");
        assert_eq!(
            generate_output_path(Path::new("notes/todo.txt"), None, out),
            PathBuf::from("translated/todo_translated.txt")
        );
        assert_eq!(
            generate_output_path(Path::new("Makefile"), Some(Path::new("/elsewhere")), out),
            PathBuf::from("translated/Makefile_translated")
        );
    }

    #[test]
    fn test_inline_output_path_is_sanitized() {
        assert_eq!(
            inline_output_path("stdin", Path::new("out")),
            PathBuf::from("out/translated_stdin.txt")
        );
        assert_eq!(
            inline_output_path("a/b c", Path::new("out")),
            PathBuf::from("out/translated_a_b_c.txt")
        );
    }
}
