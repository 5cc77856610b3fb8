/// Execution context for one program run.
///
/// Carries the output stream that `print` statements append to; the driver
/// retrieves the finished buffer once evaluation completes.
#[derive(Debug, Default)]
pub struct Context {
    output: String,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_stream(&mut self) -> &mut String {
        &mut self.output
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }
}
