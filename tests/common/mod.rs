//! 集成测试公共模块

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// 标准测试访问日志行（Combined Log Format）
#[allow(dead_code)]
pub const SAMPLE_LINE: &str = r#"127.0.0.1 - - [10/Oct/2023:13:55:36 -0700] "GET /index.php?a=1 HTTP/1.1" 200 2326 "-" "Mozilla/5.0""#;

/// 在临时目录中创建测试日志文件
#[allow(dead_code)]
pub fn create_test_log(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).expect("Failed to write test file");
    file_path
}

/// 第 `i` 条有效日志行，时间按秒递增，IP 在 4 个地址之间轮换
#[allow(dead_code)]
pub fn valid_line(i: usize) -> String {
    format!(
        r#"10.0.0.{} - - [10/Oct/2023:{:02}:{:02}:{:02} +0000] "GET /page{}.php?n={} HTTP/1.1" 200 512 "https://example.com/" "curl/8.0""#,
        i % 4 + 1,
        i / 3600,
        i / 60 % 60,
        i % 60,
        i,
        i
    )
}

/// 会被解析器拒绝的行（静态资源）
#[allow(dead_code)]
pub fn asset_line(i: usize) -> String {
    format!(
        r#"10.0.0.9 - - [10/Oct/2023:00:00:{:02} +0000] "GET /static/app{}.css HTTP/1.1" 200 100 "-" "curl/8.0""#,
        i % 60,
        i
    )
}

/// 生成 `valid` 条有效行和 `invalid` 条无效行，交错排列
#[allow(dead_code)]
pub fn mixed_content(valid: usize, invalid: usize) -> String {
    let mut lines = Vec::with_capacity(valid + invalid);
    let (mut v, mut x) = (0, 0);
    while v < valid || x < invalid {
        if v < valid {
            lines.push(valid_line(v));
            v += 1;
        }
        if x < invalid {
            lines.push(asset_line(x));
            x += 1;
        }
    }
    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// 在临时目录中创建包含 `valid` 条有效行的日志文件
#[allow(dead_code)]
pub fn create_valid_log(dir: &TempDir, filename: &str, valid: usize) -> PathBuf {
    create_test_log(dir, filename, &mixed_content(valid, 0))
}

/// 临时目录下匹配所有 `.log` 文件的模式
#[allow(dead_code)]
pub fn log_pattern(dir: &TempDir) -> String {
    dir.path().join("*.log").display().to_string()
}
