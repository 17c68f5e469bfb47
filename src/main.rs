use anyhow::{Context, Result};
use paper_cart::cli::{self, Command, Flow};
use paper_cart::utils::logging;
use paper_cart::workflow::StdinConfirm;
use paper_cart::{Config, QuestionBankClient, Session};
use std::io::{self, BufRead, Write};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load().context("加载配置失败")?;

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config);

    let client = QuestionBankClient::new(&config);
    let mut session = Session::new(&config, client, StdinConfirm);

    // 启动时加载标签，失败不影响后续操作
    let _ = session.load_tags().await;
    for notice in session.notices_mut().drain() {
        println!("{}", notice);
    }
    println!("{}", cli::HELP);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().context("无法写入终端")?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("无法读取输入")? == 0 {
            break;
        }

        match Command::parse(&line) {
            Ok(Some(command)) => {
                if cli::run_command(&mut session, command).await == Flow::Quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => println!("❌ {}", e),
        }
    }

    println!("👋 再见");
    Ok(())
}
