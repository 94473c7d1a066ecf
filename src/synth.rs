//! Synthesis of stacks into Terraform JSON configuration.
//!
//! [`document`] renders one stack into the JSON document Terraform reads
//! (`cdk.tf.json`). [`App`] groups stacks and writes the on-disk layout the
//! external engine is pointed at:
//!
//! ```text
//! <outdir>/
//! ├── manifest.json
//! └── stacks/
//!     └── <stack>/
//!         └── cdk.tf.json
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::checks;
use crate::error::{Error, Result};
use crate::reference::validate_stack_name;
use crate::stack::{Stack, TerraformOutput};

/// File name of a synthesized stack.
pub const STACK_FILE: &str = "cdk.tf.json";

/// File name of the app manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Version string of the manifest format.
pub const MANIFEST_VERSION: &str = "1";

/// Provider source and version constraint written to `required_providers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderRequirement {
    /// Registry source address
    pub source: String,
    /// Version constraint
    pub version: String,
}

impl Default for ProviderRequirement {
    fn default() -> Self {
        Self {
            source: "hashicorp/aws".to_string(),
            version: "~> 5.0".to_string(),
        }
    }
}

/// Document-level metadata under the `//` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentComment {
    /// Stack metadata
    pub metadata: DocumentMetadata,
}

/// Stack metadata recorded in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// State backend kind
    pub backend: String,
    /// Stack name
    pub stack_name: String,
    /// Tool version that produced the document
    pub version: String,
}

/// The `terraform` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerraformBlock {
    /// Local state backend
    pub backend: IndexMap<String, Value>,
    /// Provider requirements
    pub required_providers: IndexMap<String, ProviderRequirement>,
}

/// A synthesized Terraform JSON document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerraformDocument {
    /// Metadata comment
    #[serde(rename = "//")]
    pub comment: DocumentComment,
    /// Settings block
    pub terraform: TerraformBlock,
    /// Provider blocks by provider name
    pub provider: IndexMap<String, Vec<Value>>,
    /// Resource bodies by type, then construct id
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub resource: IndexMap<String, IndexMap<String, Value>>,
    /// Outputs by name
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub output: IndexMap<String, TerraformOutput>,
}

impl TerraformDocument {
    /// Body of one resource, if present.
    pub fn resource_body(&self, resource_type: &str, id: &str) -> Option<&Value> {
        self.resource.get(resource_type).and_then(|r| r.get(id))
    }

    /// Serialize the document.
    pub fn render(&self, pretty: bool) -> Result<String> {
        let rendered = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(rendered)
    }
}

/// Render `stack` into a Terraform JSON document.
pub fn document(stack: &Stack, requirement: &ProviderRequirement) -> Result<TerraformDocument> {
    validate_stack_name(stack.name())?;
    let provider = stack
        .provider()
        .ok_or_else(|| Error::synth(stack.name(), "no AWS provider configured"))?;

    // Acyclic by construction; verify before handing it to the engine.
    stack.creation_order()?;

    let mut resource: IndexMap<String, IndexMap<String, Value>> = IndexMap::new();
    for (id, declaration) in stack.declarations() {
        let mut body = declaration.body()?;
        let fields = body.as_object_mut().ok_or_else(|| {
            Error::synth(stack.name(), format!("'{}' did not render to an object", id))
        })?;
        fields.insert(
            "//".to_string(),
            json!({
                "metadata": {
                    "path": format!("{}/{}", stack.name(), id),
                    "uniqueId": id,
                }
            }),
        );

        resource
            .entry(declaration.kind().terraform_type().to_string())
            .or_default()
            .insert(id.to_string(), body);
    }

    let mut backend = IndexMap::new();
    backend.insert(
        "local".to_string(),
        json!({ "path": format!("terraform.{}.tfstate", stack.name()) }),
    );

    let mut required_providers = IndexMap::new();
    required_providers.insert("aws".to_string(), requirement.clone());

    let mut providers = IndexMap::new();
    providers.insert("aws".to_string(), vec![serde_json::to_value(provider)?]);

    Ok(TerraformDocument {
        comment: DocumentComment {
            metadata: DocumentMetadata {
                backend: "local".to_string(),
                stack_name: stack.name().to_string(),
                version: crate::version().to_string(),
            },
        },
        terraform: TerraformBlock {
            backend,
            required_providers,
        },
        provider: providers,
        resource,
        output: stack
            .outputs()
            .map(|(name, o)| (name.to_string(), o.clone()))
            .collect(),
    })
}

/// One stack entry of the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackManifest {
    /// Stack name
    pub name: String,
    /// Path of the synthesized document, relative to the outdir
    pub synthesized_stack_path: PathBuf,
    /// Directory the engine should run in, relative to the outdir
    pub working_directory: PathBuf,
    /// Output names declared by the stack
    pub outputs: Vec<String>,
}

/// The app manifest written next to the stacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version
    pub version: String,
    /// Stacks by name
    pub stacks: IndexMap<String, StackManifest>,
}

impl Manifest {
    /// Read a manifest from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// A set of stacks synthesized together into one output directory.
#[derive(Debug, Clone)]
pub struct App {
    outdir: PathBuf,
    requirement: ProviderRequirement,
    pretty: bool,
    stacks: IndexMap<String, Stack>,
}

impl App {
    /// Create an app writing to `outdir`.
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
            requirement: ProviderRequirement::default(),
            pretty: true,
            stacks: IndexMap::new(),
        }
    }

    /// Set the provider requirement.
    pub fn with_provider_requirement(mut self, requirement: ProviderRequirement) -> Self {
        self.requirement = requirement;
        self
    }

    /// Toggle pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Output directory.
    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Add a stack; names must be unique within the app.
    pub fn add_stack(&mut self, stack: Stack) -> Result<()> {
        validate_stack_name(stack.name())?;
        if self.stacks.contains_key(stack.name()) {
            return Err(Error::synth(stack.name(), "a stack with this name is already in the app"));
        }
        self.stacks.insert(stack.name().to_string(), stack);
        Ok(())
    }

    /// Look up a stack by name.
    pub fn stack(&self, name: &str) -> Result<&Stack> {
        self.stacks
            .get(name)
            .ok_or_else(|| Error::StackNotFound(name.to_string()))
    }

    /// Stacks in insertion order.
    pub fn stacks(&self) -> impl Iterator<Item = &Stack> {
        self.stacks.values()
    }

    /// Check and render one stack without touching the filesystem.
    pub fn synth_stack(&self, name: &str) -> Result<TerraformDocument> {
        let stack = self.stack(name)?;
        let report = checks::run(stack);
        debug!(
            stack = name,
            errors = report.error_count(),
            warnings = report.warnings().count(),
            "checked stack"
        );
        if !report.is_ok() {
            return Err(Error::ChecksFailed {
                stack: name.to_string(),
                count: report.error_count(),
            });
        }
        document(stack, &self.requirement)
    }

    /// Synthesize every stack and write the manifest.
    pub async fn synth(&self) -> Result<Manifest> {
        let mut manifest = Manifest {
            version: MANIFEST_VERSION.to_string(),
            stacks: IndexMap::new(),
        };

        for name in self.stacks.keys() {
            let doc = self.synth_stack(name)?;
            let working_directory = Path::new("stacks").join(name);
            let relative = working_directory.join(STACK_FILE);

            let dir = self.outdir.join(&working_directory);
            tokio::fs::create_dir_all(&dir).await?;
            tokio::fs::write(self.outdir.join(&relative), doc.render(self.pretty)?).await?;

            info!(
                stack = name.as_str(),
                path = %self.outdir.join(&relative).display(),
                resources = doc.resource.values().map(IndexMap::len).sum::<usize>(),
                "synthesized stack"
            );

            manifest.stacks.insert(
                name.clone(),
                StackManifest {
                    name: name.clone(),
                    synthesized_stack_path: relative,
                    working_directory,
                    outputs: doc.output.keys().cloned().collect(),
                },
            );
        }

        tokio::fs::create_dir_all(&self.outdir).await?;
        tokio::fs::write(
            self.outdir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )
        .await?;

        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{AwsProvider, Subnet, Vpc};
    use pretty_assertions::assert_eq;

    fn small_stack() -> Stack {
        let mut stack = Stack::new("small");
        stack.set_provider(AwsProvider::new("ca-central-1")).unwrap();
        let vpc = stack
            .declare("net", Vpc::new("10.0.0.0/16".parse().unwrap()).tag("Name", "net"))
            .unwrap();
        stack
            .declare(
                "sub",
                Subnet::new(vpc.id(), "10.0.1.0/24".parse().unwrap(), "ca-central-1a"),
            )
            .unwrap();
        stack.output("vpc_id", vpc.id()).unwrap();
        stack
    }

    #[test]
    fn test_document_shape() {
        let doc = document(&small_stack(), &ProviderRequirement::default()).unwrap();
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["//"]["metadata"]["stackName"], "small");
        assert_eq!(value["terraform"]["required_providers"]["aws"]["source"], "hashicorp/aws");
        assert_eq!(
            value["terraform"]["backend"]["local"]["path"],
            "terraform.small.tfstate"
        );
        assert_eq!(value["provider"]["aws"][0]["region"], "ca-central-1");
        assert_eq!(value["resource"]["aws_vpc"]["net"]["cidr_block"], "10.0.0.0/16");
        assert_eq!(
            value["resource"]["aws_subnet"]["sub"]["vpc_id"],
            "${aws_vpc.net.id}"
        );
        assert_eq!(
            value["resource"]["aws_subnet"]["sub"]["//"]["metadata"]["path"],
            "small/sub"
        );
        assert_eq!(value["output"]["vpc_id"]["value"], "${aws_vpc.net.id}");
    }

    #[test]
    fn test_document_requires_provider() {
        let stack = Stack::new("bare");
        assert!(matches!(
            document(&stack, &ProviderRequirement::default()),
            Err(Error::Synth { .. })
        ));
    }

    #[test]
    fn test_resource_types_keep_declaration_order() {
        let doc = document(&small_stack(), &ProviderRequirement::default()).unwrap();
        let types: Vec<&str> = doc.resource.keys().map(String::as_str).collect();
        assert_eq!(types, vec!["aws_vpc", "aws_subnet"]);
        assert!(doc.resource_body("aws_vpc", "net").is_some());
        assert!(doc.resource_body("aws_vpc", "sub").is_none());
    }

    #[test]
    fn test_synth_stack_refuses_failing_checks() {
        let mut app = App::new("unused");
        let mut stack = Stack::new("broken");
        stack.set_provider(AwsProvider::new("ca-central-1")).unwrap();
        let vpc = stack
            .declare("net", Vpc::new("10.0.0.0/16".parse().unwrap()))
            .unwrap();
        stack
            .declare(
                "sub",
                Subnet::new(vpc.id(), "192.168.0.0/24".parse().unwrap(), "ca-central-1a"),
            )
            .unwrap();
        app.add_stack(stack).unwrap();

        assert!(matches!(
            app.synth_stack("broken"),
            Err(Error::ChecksFailed { count: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_and_missing_stacks() {
        let mut app = App::new("unused");
        app.add_stack(small_stack()).unwrap();
        assert!(app.add_stack(small_stack()).is_err());
        assert!(matches!(app.stack("nope"), Err(Error::StackNotFound(_))));
    }
}
