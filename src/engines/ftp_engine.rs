// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, ProbeResponse, ProbeTransport};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

const DEFAULT_FTP_PORT: u16 = 21;
const ANONYMOUS_USER: &str = "anonymous";
const ANONYMOUS_PASSWORD: &str = "anonymous@";

/// FTP控制连接上的一条应答
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reply {
    code: u16,
    message: String,
}

impl Reply {
    fn into_error(self) -> EngineError {
        EngineError::Ftp {
            code: self.code,
            message: self.message,
        }
    }
}

/// FTP控制连接
struct Control {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Control {
    async fn connect(host: &str, port: u16) -> Result<Self, EngineError> {
        let stream = TcpStream::connect((host, port)).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    /// 读取一条应答，支持 `123-...` 形式的多行应答
    async fn read_reply(&mut self) -> Result<Reply, EngineError> {
        let first = self.read_line().await?;
        let code = parse_code(&first)?;
        let mut message = first.get(4..).unwrap_or_default().to_string();

        if first.as_bytes().get(3) == Some(&b'-') {
            let terminator = format!("{} ", code);
            loop {
                let line = self.read_line().await?;
                if line.starts_with(&terminator) {
                    message = line[terminator.len()..].to_string();
                    break;
                }
            }
        }

        Ok(Reply { code, message })
    }

    async fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            return Err(EngineError::Other(
                "FTP server closed the control connection".to_string(),
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    async fn command(&mut self, command: &str) -> Result<Reply, EngineError> {
        self.writer
            .write_all(format!("{}\r\n", command).as_bytes())
            .await?;
        self.read_reply().await
    }
}

fn parse_code(line: &str) -> Result<u16, EngineError> {
    line.get(..3)
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| EngineError::Other(format!("Malformed FTP reply: {:?}", line)))
}

/// FTP探测引擎
///
/// 登录（默认匿名）后用 `SIZE` 检查文件，失败时再用 `CWD` 检查目录
#[derive(Clone, Debug, Default)]
pub struct FtpEngine;

impl FtpEngine {
    pub fn new() -> Self {
        Self
    }

    async fn login(control: &mut Control, credentials: &Credentials) -> Result<(), EngineError> {
        let greeting = control.read_reply().await?;
        if greeting.code != 220 {
            return Err(greeting.into_error());
        }

        let reply = control.command(&format!("USER {}", credentials.user)).await?;
        match reply.code {
            230 => Ok(()),
            331 | 332 => {
                let reply = control
                    .command(&format!("PASS {}", credentials.password))
                    .await?;
                match reply.code {
                    230 | 202 => Ok(()),
                    _ => Err(reply.into_error()),
                }
            }
            _ => Err(reply.into_error()),
        }
    }
}

/// 登录凭据，未指定时使用匿名账户
struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    fn from_url(url: &Url) -> Result<Self, EngineError> {
        let user = match url.username() {
            "" => ANONYMOUS_USER.to_string(),
            name => control_argument("user name", decode(name))?,
        };
        let password = match url.password() {
            Some(raw) => control_argument("password", decode(raw))?,
            None => ANONYMOUS_PASSWORD.to_string(),
        };
        Ok(Self { user, password })
    }
}

/// 控制连接的命令参数不能包含换行
fn control_argument(what: &str, value: String) -> Result<String, EngineError> {
    if value.contains(['\r', '\n']) {
        return Err(EngineError::Other(format!(
            "FTP {} contains a line break",
            what
        )));
    }
    Ok(value)
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

#[async_trait]
impl ProbeTransport for FtpEngine {
    async fn check(&self, url: &Url) -> Result<ProbeResponse, EngineError> {
        if url.scheme() != "ftp" {
            return Err(EngineError::UnsupportedScheme(url.scheme().to_string()));
        }
        let host = url
            .host_str()
            .ok_or_else(|| EngineError::Other(format!("No host in {}", url)))?;
        let port = url.port().unwrap_or(DEFAULT_FTP_PORT);
        let path = match control_argument("path", decode(url.path()))? {
            p if p.is_empty() => "/".to_string(),
            p => p,
        };
        let credentials = Credentials::from_url(url)?;

        let mut control = Control::connect(host, port).await?;
        Self::login(&mut control, &credentials).await?;

        // SIZE is refused in ASCII mode by many servers
        let _ = control.command("TYPE I").await?;
        let size = control.command(&format!("SIZE {}", path)).await?;
        let outcome = if size.code == 213 {
            Ok(ProbeResponse::Exists)
        } else {
            let cwd = control.command(&format!("CWD {}", path)).await?;
            if cwd.code == 250 {
                Ok(ProbeResponse::Exists)
            } else {
                Err(size.into_error())
            }
        };

        if let Err(e) = control.command("QUIT").await {
            debug!("FTP QUIT to {} failed: {}", host, e);
        }
        debug!("FTP check {} -> {:?}", url, outcome.as_ref().map(|_| "exists"));

        outcome
    }

    fn name(&self) -> &'static str {
        "ftp"
    }
}
