// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::ComponentError;
use crate::traits::{Component, ComponentClass, ComponentInfo, Inputs, PortInfo, StepContext};
use crate::value::TemporaryFile;
use crate::workflow::ComponentDef;

pub const EMPTY_FILE_IDENTITY: &str = "cacheflow.builtin.empty_file";

/// Produces a fresh empty temporary file on output `file`.
pub struct EmptyFile;

impl ComponentClass for EmptyFile {
    fn identity(&self) -> &str {
        EMPTY_FILE_IDENTITY
    }

    fn info(&self) -> ComponentInfo {
        ComponentInfo {
            label: "Empty file".to_string(),
            inputs: vec![PortInfo::single("suffix")],
            outputs: vec!["file".to_string()],
        }
    }

    fn instantiate(&self, _step_id: &str, _def: &ComponentDef) -> Result<Box<dyn Component>, ComponentError> {
        Ok(Box::new(EmptyFileComponent))
    }
}

struct EmptyFileComponent;

#[async_trait]
impl Component for EmptyFileComponent {
    async fn execute(&mut self, inputs: Inputs, ctx: &mut StepContext) -> Result<(), ComponentError> {
        let suffix = match inputs.single("suffix") {
            Some(value) => Some(
                value
                    .as_str()
                    .ok_or("input 'suffix' must be a string")?
                    .to_string(),
            ),
            None => None,
        };
        let file = TemporaryFile::create(ctx.temp_dir(), suffix.as_deref())?;
        ctx.set_output("file", file);
        Ok(())
    }
}
