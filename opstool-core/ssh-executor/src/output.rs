//! 输出聚合
//!
//! 通道数据按到达顺序分块送入，多字节字符可能被拆在两个块之间，
//! 解码器会保留未完整的尾部字节，等下一块到达后再解码。

use encoding_rs::{CoderResult, Decoder, UTF_8};

/// 增量 UTF-8 解码器
///
/// 不处理 BOM，远端写出的字节原样解码。
pub struct StreamDecoder {
    decoder: Decoder,
    text: String,
}

impl std::fmt::Debug for StreamDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamDecoder")
            .field("text_len", &self.text.len())
            .finish()
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_without_bom_handling(),
            text: String::new(),
        }
    }

    /// 追加一块字节
    pub fn push(&mut self, chunk: &[u8]) {
        self.decode(chunk, false);
    }

    /// 结束解码，残留的不完整字节输出为替换字符
    pub fn finish(mut self) -> String {
        self.decode(&[], true);
        self.text
    }

    fn decode(&mut self, mut src: &[u8], last: bool) {
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(src.len())
                .unwrap_or(src.len() * 3 + 4);
            self.text.reserve(needed);

            let (result, read, _) = self.decoder.decode_to_string(src, &mut self.text, last);
            src = &src[read..];

            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
    }
}

/// 标准输出 / 标准错误聚合器
#[derive(Debug, Default)]
pub struct OutputAggregator {
    stdout: StreamDecoder,
    stderr: StreamDecoder,
}

impl OutputAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_stdout(&mut self, chunk: &[u8]) {
        self.stdout.push(chunk);
    }

    pub fn push_stderr(&mut self, chunk: &[u8]) {
        self.stderr.push(chunk);
    }

    /// 结束聚合，返回 (stdout, stderr)
    pub fn finish(self) -> (String, String) {
        (self.stdout.finish(), self.stderr.finish())
    }
}
