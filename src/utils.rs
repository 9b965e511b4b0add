// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::io::Stdin;
use tokio::io::stdin;

use crate::error::Fallible;

/// Poll until something accepts connections on the port.
#[cfg(test)]
pub async fn wait_for_server(host: &str, port: u16) -> Fallible<()> {
    use std::time::Duration;

    use tokio::net::TcpStream;
    use tokio::time::sleep;

    loop {
        if let Ok(stream) = TcpStream::connect(format!("{host}:{port}")).await {
            drop(stream);
            break;
        }
        sleep(Duration::from_millis(1)).await;
    }
    Ok(())
}

/// Line-at-a-time reader over standard input for the interactive commands.
pub struct Prompt {
    lines: tokio::io::Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(stdin()).lines(),
        }
    }

    /// The next trimmed line, or `None` at end of input.
    pub async fn line(&mut self) -> Fallible<Option<String>> {
        Ok(self.lines.next_line().await?.map(|l| l.trim().to_string()))
    }
}
