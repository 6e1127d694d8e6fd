// Dweve Kotlin LSP - Heuristic Kotlin Language Server
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Server configuration.
//!
//! Settings are loaded by the editor extension and forwarded as
//! `initializationOptions`. None of them change how documents are analyzed;
//! they only decide whether the server offers any features and how much it
//! reports back to the client.
//!
//! ```json
//! {
//!   "enabled": true,
//!   "languageServerPath": "/opt/kotlin-lsp/bin/kotlin-lsp",
//!   "javaHome": "/usr/lib/jvm/java-17",
//!   "trace": "messages"
//! }
//! ```

use crate::error::{Result, ServerError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Verbosity of request traces mirrored to the client log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    /// No client-side tracing.
    #[default]
    Off,
    /// One line per request.
    Messages,
    /// Request lines plus result sizes.
    Verbose,
}

impl TraceLevel {
    pub fn is_enabled(self) -> bool {
        self != TraceLevel::Off
    }
}

/// Settings forwarded by the client at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Master switch. A disabled server advertises no capabilities.
    pub enabled: bool,
    /// Custom path to the server binary, used by the client launcher.
    pub language_server_path: Option<String>,
    /// Custom runtime home, used by the client launcher.
    pub java_home: Option<String>,
    /// Client trace verbosity.
    pub trace: TraceLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language_server_path: None,
            java_home: None,
            trace: TraceLevel::Off,
        }
    }
}

impl ServerConfig {
    /// Parse the `initializationOptions` value.
    ///
    /// A missing or `null` value yields the defaults. Unknown keys are ignored.
    pub fn from_initialization_options(options: Option<&Value>) -> Result<Self> {
        match options {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(ServerError::InvalidConfig)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_options_use_defaults() {
        let config = ServerConfig::from_initialization_options(None).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert!(config.enabled);

        let config = ServerConfig::from_initialization_options(Some(&Value::Null)).unwrap();
        assert_eq!(config.trace, TraceLevel::Off);
    }

    #[test]
    fn test_full_options() {
        let options = json!({
            "enabled": false,
            "languageServerPath": "/opt/kls",
            "javaHome": "/usr/lib/jvm/17",
            "trace": "verbose"
        });
        let config = ServerConfig::from_initialization_options(Some(&options)).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.language_server_path.as_deref(), Some("/opt/kls"));
        assert_eq!(config.java_home.as_deref(), Some("/usr/lib/jvm/17"));
        assert_eq!(config.trace, TraceLevel::Verbose);
        assert!(config.trace.is_enabled());
    }

    #[test]
    fn test_partial_options_keep_defaults() {
        let options = json!({ "trace": "messages", "somethingElse": 3 });
        let config = ServerConfig::from_initialization_options(Some(&options)).unwrap();
        assert!(config.enabled);
        assert_eq!(config.trace, TraceLevel::Messages);
    }

    #[test]
    fn test_malformed_options() {
        let options = json!({ "enabled": "yes please" });
        let err = ServerConfig::from_initialization_options(Some(&options)).unwrap_err();
        assert!(matches!(err, ServerError::InvalidConfig(_)));
    }
}
