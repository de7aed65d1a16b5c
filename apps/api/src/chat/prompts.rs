// Chat prompt templates.
// The résumé is static: there is one owner and one document.

pub const SYSTEM_PROMPT: &str = "你是李海龙的个人AI助手。基于他的简历信息回答问题，回答要简洁专业，使用中文回复。如果问题与简历无关，可以正常对话但适当引导回简历相关话题。";

pub const RESUME_CONTEXT: &str = "李海龙，算法工程师。腾讯科技风控算法方向，负责社交反欺诈与支付安全。擅长图算法、时序建模、多模态融合与 Graph+LLM 结合。
教育：西安电子科技大学硕士（电子科学与技术，2018-2021），本科（智能科学与技术，2014-2018）。
核心项目：刷单反欺诈（构建图召回+时序精排+梯度打击三层架构，受害者下降85%）；支付安全（多模态识别欺诈收款号，召回85%，干预90%，资损下降65%）；Graph+LLM 欺诈识别（Qwen3-1.7B 微调准确率90.3%）；电竞视频关键帧提取与聚类（YOLOv3 mAP 93%，推荐准确率92%）。
技能：Python/C++/SQL/Lua，Flink/Spark/Hive/HDFS/Neo4j，PyTorch/TensorFlow/Caffe，CNN/RNN/GNN/Transformer，RAG。
实习：杭州海康威视研究院，智能算法工程师，EfficientNet 人/车/动物三分类，准确率91%→96%。
荣誉：互联网+银奖、美赛H奖、中兴捧月全国优胜、2项专利。";

/// Builds the single user message sent to the provider. The question is
/// passed through untouched: no trimming, no length limit.
pub fn compose_prompt(question: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\n简历信息：\n{RESUME_CONTEXT}\n\n用户问题：{question}")
}

/// First `max_chars` characters of `text`, for log lines.
pub fn log_excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
