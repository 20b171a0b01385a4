//! 访问日志解析的工具函数

/// 将请求目标拆分为路径和查询串。
///
/// - 丢弃 `#` 之后的片段
/// - 绝对形式（`http://host/path`）只保留路径部分
/// - 空查询串（`/a?`）视为 `None`
#[must_use]
pub fn split_request_target(target: &str) -> (&str, Option<&str>) {
    let target = target.split_once('#').map_or(target, |(head, _)| head);
    let target = strip_authority(target);

    match target.split_once('?') {
        Some((path, query)) if query.is_empty() => (path, None),
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// 去掉绝对形式请求目标中的 `scheme://host` 前缀
fn strip_authority(target: &str) -> &str {
    let Some(scheme_end) = target.find("://") else {
        return target;
    };
    // scheme 只允许出现在 `?` 之前
    if target[..scheme_end].contains(['/', '?']) {
        return target;
    }
    let rest = &target[scheme_end + 3..];
    match rest.find(['/', '?']) {
        Some(pos) => &rest[pos..],
        None => "",
    }
}

/// 返回路径最后一段的扩展名（最后一个 `.` 之后的文本）。
///
/// 没有 `.` 时返回 `None`；以 `.` 结尾时返回空字符串。
#[must_use]
pub fn path_extension(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    segment.rsplit_once('.').map(|(_, ext)| ext)
}

/// 判断路径是否为需要保留的动态请求（无扩展名或 `.php`）
#[must_use]
pub fn is_dynamic_path(path: &str) -> bool {
    match path_extension(path) {
        None | Some("") | Some("php") => true,
        Some(_) => false,
    }
}
