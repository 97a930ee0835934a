//! Prompt assembly for the answering call.

use super::engine::RetrievedDoc;

/// Canned reply when retrieval comes back empty. No generation call is made
/// in that case.
pub const NO_RESULTS_MESSAGE: &str = "Üzgünüm, sorunuzla ilgili yeterli bilgi bulamadım. Lütfen daha detaylı belirtiler yazın.\n Örneğin 24 yaşındayım, baş ağrım ve mide bulantım var";

/// Per-document excerpt length inside the context block, in characters.
pub const CONTEXT_PREVIEW_CHARS: usize = 500;

/// Render retrieved documents into the context block, best match first,
/// each tagged with its similarity score and cut to a bounded preview.
pub fn build_context(docs: &[RetrievedDoc], scores: &[f32]) -> String {
    docs.iter()
        .zip(scores)
        .map(|(doc, score)| {
            let preview: String = doc.text.chars().take(CONTEXT_PREVIEW_CHARS).collect();
            format!("[Benzerlik: {score:.2}] {preview}...")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The single instruction prompt handed to the text-generation backend.
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "\
Sen deneyimli bir tıbbi asistan AI'sın. Aşağıdaki yapılandırılmış tıbbi bilgiler ışığında kullanıcının belirtilerini analiz et.

**ÖNEMLİ KURALLAR:**
1. SADECE verilen konteksteki bilgileri kullan
2. Kesin tanı koyma, sadece olasılıkları belirt
3. Aciliyet seviyesini net bir şekilde belirt
4. Hangi tıbbi birime başvurması gerektiğini söyle
5. Aciliyet seviyesini belirtirken acile hemen gidilmeli mi gidilmemeli mi sorusuna cevap verecek şekilde düzenle.

**KONTEKST (Benzerlik skorlarıyla sıralanmış):**
{context}

**KULLANICI BELİRTİLERİ:**
{question}

**YANIT FORMATI:**
🔍 Olası Durum(lar): [En olası 1-2 hastalık]

⚠️ Aciliyet Seviyesi: [Düşük/Orta/Yüksek/ACİL]

🏥 Başvuru Birimi: [Hangi bölüm/uzman]

📝 Açıklama: [Kısa değerlendirme ve öneriler]

⚡ Eğer ACİL: Derhal hastaneye başvurun!

Eğer verilen bilgilerle eşleşme bulamazsan: \"Bu belirtilerle tam eşleşen bilgi yok, genel tıbbi değerlendirme öneriyorum.\""
    )
}
