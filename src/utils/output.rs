//! # 美化输出工具
//!
//! 提供统一的终端输出样式。`--quiet` 时只屏蔽信息与明细输出，
//! 警告和错误始终打印。
//!
//! ## 依赖关系
//! - 被 `commands/`, `vacancy/` 模块使用
//! - 使用 `colored` crate

use colored::Colorize;

use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// 设置安静模式
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// 打印成功消息
pub fn print_success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "[OK]".green().bold(), msg);
    }
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "[*]".blue().bold(), msg);
    }
}

/// 打印一行缩进的 `名称: 值`
pub fn print_detail(label: &str, value: &str) {
    if !is_quiet() {
        println!("    {} {}", format!("{}:", label).dimmed(), value);
    }
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "[DONE]".green().bold(), msg);
    }
}

/// 打印标题栏
pub fn print_header(title: &str) {
    if is_quiet() {
        return;
    }
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印分隔线
pub fn print_separator() {
    if !is_quiet() {
        println!("{}", "─".repeat(60).dimmed());
    }
}
